use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::test::fixtures::{CpuSubtract, Scale, Subtract, default_backend, f32_buffer, f32_zeros};
use crate::{
    ArgKind, ArgumentContext, Buffer, Direction, Error, GBuffer, GOpaque, GScalar, GSequence, KernelApi, KernelFn,
    KernelImpl, KernelSignature, OpaqueRef, Scalar, SequenceRef,
};

#[test]
fn test_inputs_are_positional() {
    let a = f32_buffer(&[3], &[10.0, 20.0, 30.0]);
    let b = f32_buffer(&[3], &[1.0, 2.0, 3.0]);
    let mut dst = f32_zeros(&[3]);

    let handle = CpuSubtract::kernel(&default_backend());
    let mut ctx = ArgumentContext::new().with_input(&a).with_input(&b).with_output(0, &mut dst);
    handle.apply(&mut ctx).unwrap();
    drop(ctx);

    assert_eq!(dst.to_vec::<f32>().unwrap(), vec![9.0, 18.0, 27.0]);
}

#[test]
fn test_arity_mismatch_checked_before_arguments() {
    let src = f32_buffer(&[2], &[1.0, 2.0]);
    let mut dst = f32_buffer(&[2], &[7.0, 7.0]);
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let kernel = move |_: &Buffer, _: &Scalar, _: &mut Buffer| {
        counter.fetch_add(1, Ordering::Relaxed);
    };

    // Missing the scalar input.
    let mut ctx = ArgumentContext::new().with_input(&src).with_output(0, &mut dst);
    let err = KernelFn::<(GBuffer, GScalar), (GBuffer,)>::dispatch(&kernel, &mut ctx, true).unwrap_err();
    drop(ctx);

    assert!(matches!(
        err,
        Error::ArityMismatch { expected_inputs: 2, actual_inputs: 1, expected_outputs: 1, actual_outputs: 1 }
    ));
    assert_eq!(calls.load(Ordering::Relaxed), 0);
    assert_eq!(dst.to_vec::<f32>().unwrap(), vec![7.0, 7.0]);
}

#[test]
fn test_extra_output_is_arity_mismatch() {
    let src = f32_zeros(&[1]);
    let mut dst = f32_zeros(&[1]);
    let mut extra = Scalar::default();
    let kernel = |_: &Buffer, _: &mut Buffer| {};

    let mut ctx = ArgumentContext::new().with_input(&src).with_output(0, &mut dst).with_output(1, &mut extra);
    let err = KernelFn::<(GBuffer,), (GBuffer,)>::dispatch(&kernel, &mut ctx, true).unwrap_err();

    assert!(matches!(err, Error::ArityMismatch { expected_outputs: 1, actual_outputs: 2, .. }));
}

#[test]
fn test_buffer_where_scalar_declared() {
    let src = f32_zeros(&[1]);
    let not_a_scalar = f32_zeros(&[1]);
    let mut dst = f32_zeros(&[1]);

    let handle = crate::test::fixtures::CpuScale::kernel(&default_backend());
    let mut ctx = ArgumentContext::new().with_input(&src).with_input(&not_a_scalar).with_output(0, &mut dst);
    let err = handle.apply(&mut ctx).unwrap_err();

    assert!(matches!(err, Error::Kernel { ref id, .. } if id == Scale::ID));
    assert!(matches!(
        err.root(),
        Error::TypeMismatch { direction: Direction::Input, index: 1, expected: "scalar", actual: "buffer" }
    ));
}

#[test]
fn test_outputs_follow_inputs_in_declared_order() {
    let src = f32_buffer(&[4], &[1.0, 2.0, 3.0, 4.0]);
    let mut total = Scalar::default();
    let mut doubled = SequenceRef::empty::<f32>();
    let mut count = OpaqueRef::new(0usize);
    let kernel = |src: &Buffer, total: &mut Scalar, doubled: &mut Vec<f32>, count: &mut usize| -> crate::Result<()> {
        let data = src.as_slice::<f32>()?;
        total[0] = data.iter().map(|v| f64::from(*v)).sum();
        doubled.extend(data.iter().map(|v| v * 2.0));
        *count = data.len();
        Ok(())
    };

    let mut ctx = ArgumentContext::new()
        .with_input(&src)
        .with_output(0, &mut total)
        .with_output(1, &mut doubled)
        .with_output(2, &mut count);
    KernelFn::<(GBuffer,), (GScalar, GSequence<f32>, GOpaque<usize>)>::dispatch(&kernel, &mut ctx, true).unwrap();
    drop(ctx);

    assert_eq!(total[0], 10.0);
    assert_eq!(doubled.into_inner::<f32>().unwrap(), vec![2.0, 4.0, 6.0, 8.0]);
    assert_eq!(count.into_inner::<usize>().unwrap(), 4);
}

#[test]
fn test_zero_argument_kernel() {
    let kernel = || {};
    let mut ctx = ArgumentContext::new();

    assert!(KernelFn::<(), ()>::dispatch(&kernel, &mut ctx, true).is_ok());
}

#[test]
fn test_kernel_error_propagates() {
    let src = crate::Buffer::filled(&[2], 1i32);
    let mut dst = f32_zeros(&[2]);
    let handle = CpuSubtract::kernel(&default_backend());

    let mut ctx = ArgumentContext::new().with_input(&src).with_input(&src).with_output(0, &mut dst);
    let err = handle.apply(&mut ctx).unwrap_err();

    assert!(matches!(err.root(), Error::Device { .. }));
}

#[test]
fn test_signature_of_api() {
    let signature = Subtract::signature();

    assert_eq!(signature.inputs.as_slice(), &[ArgKind::Buffer, ArgKind::Buffer]);
    assert_eq!(signature.outputs.as_slice(), &[ArgKind::Buffer]);
    assert_eq!(signature.to_string(), "(buffer, buffer) -> (buffer)");
    assert_eq!(
        KernelSignature::of::<(GSequence<GBuffer>, i32), (GOpaque<GScalar>,)>().to_string(),
        "(sequence, value) -> (opaque)"
    );
}

#[test]
fn test_failed_dispatch_keeps_outputs_bound() {
    let src = f32_zeros(&[2]);
    let mut dst = f32_buffer(&[2], &[5.0, 6.0]);
    let mut not_a_scalar = SequenceRef::empty::<f32>();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let kernel = move |_: &Buffer, _: &mut Buffer, _: &mut Scalar| {
        counter.fetch_add(1, Ordering::Relaxed);
    };

    let mut ctx = ArgumentContext::new().with_input(&src).with_output(0, &mut dst).with_output(1, &mut not_a_scalar);
    let err = KernelFn::<(GBuffer,), (GBuffer, GScalar)>::dispatch(&kernel, &mut ctx, true).unwrap_err();

    assert!(matches!(err, Error::TypeMismatch { direction: Direction::Output, index: 1, expected: "scalar", .. }));
    assert_eq!(calls.load(Ordering::Relaxed), 0);
    assert_eq!(ctx.output_count(), 2);
    assert_eq!(ctx.out_buffer(0).unwrap().to_vec::<f32>().unwrap(), vec![5.0, 6.0]);
    assert!(ctx.out_sequence::<f32>(1).is_ok());
}

#[test]
fn test_successful_dispatch_keeps_outputs_bound() {
    let a = f32_buffer(&[2], &[4.0, 4.0]);
    let b = f32_buffer(&[2], &[1.0, 3.0]);
    let mut dst = f32_zeros(&[2]);
    let handle = CpuSubtract::kernel(&default_backend());

    let mut ctx = ArgumentContext::new().with_input(&a).with_input(&b).with_output(0, &mut dst);
    handle.apply(&mut ctx).unwrap();

    assert_eq!(ctx.output_count(), 1);
    assert_eq!(ctx.out_buffer(0).unwrap().to_vec::<f32>().unwrap(), vec![3.0, 1.0]);
    handle.apply(&mut ctx).unwrap();
}

#[test]
fn test_output_bound_past_declared_range() {
    let src = f32_zeros(&[1]);
    let mut dst = f32_zeros(&[1]);
    let kernel = |_: &Buffer, _: &mut Buffer| {};

    let mut ctx = ArgumentContext::new().with_input(&src).with_output(3, &mut dst);
    let err = KernelFn::<(GBuffer,), (GBuffer,)>::dispatch(&kernel, &mut ctx, true).unwrap_err();

    assert!(matches!(err, Error::IndexOutOfRange { direction: Direction::Output, index: 0, len: 1 }));
    assert!(ctx.outputs().contains(3));
}
