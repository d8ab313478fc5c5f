//! End-to-end: an executor-side package lookup and invocation.

use crate::test::fixtures::{CpuChunks, CpuScale, CpuSum, Chunks, Scale, Sum, default_backend, f32_buffer, f32_zeros};
use crate::{ArgumentContext, KernelApi, KernelPackage, OpaqueRef, Scalar, SequenceRef};

fn package() -> KernelPackage {
    let backend = default_backend();
    KernelPackage::new().with::<CpuScale>(&backend).with::<CpuSum>(&backend).with::<CpuChunks>(&backend)
}

#[test]
fn test_scale_two_by_two() {
    let package = package();
    let src = f32_buffer(&[2, 2], &[1.0, 2.0, 3.0, 4.0]);
    let mut dst = f32_zeros(&[2, 2]);
    let addr = dst.data_addr();

    let mut ctx = ArgumentContext::new().with_input(&src).with_input(Scalar::all(10.0)).with_output(0, &mut dst);
    package.lookup(Scale::ID).unwrap().apply(&mut ctx).unwrap();
    drop(ctx);

    assert_eq!(dst.shape(), &[2, 2]);
    assert_eq!(dst.to_vec::<f32>().unwrap(), vec![10.0, 20.0, 30.0, 40.0]);
    assert_eq!(dst.data_addr(), addr);
}

#[test]
fn test_sum_of_sequence() {
    let package = package();
    let seq = SequenceRef::new(vec![
        f32_buffer(&[3], &[1.0, 2.0, 3.0]),
        f32_buffer(&[3], &[10.0, 20.0, 30.0]),
        f32_buffer(&[3], &[100.0, 200.0, 300.0]),
    ]);
    let mut dst = f32_zeros(&[3]);

    let mut ctx = ArgumentContext::new().with_input(&seq).with_output(0, &mut dst);
    package.lookup(Sum::ID).unwrap().apply(&mut ctx).unwrap();
    drop(ctx);

    assert_eq!(dst.to_vec::<f32>().unwrap(), vec![111.0, 222.0, 333.0]);
}

#[test]
fn test_chunks_with_plain_value_parameter() {
    let package = package();
    let src = f32_buffer(&[6], &[1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);
    let parts = 3usize;
    let mut sums = SequenceRef::empty::<f32>();
    let mut count = OpaqueRef::new(0usize);

    let mut ctx = ArgumentContext::new()
        .with_input(&src)
        .with_value(&parts)
        .with_output(0, &mut sums)
        .with_output(1, &mut count);
    package.lookup(Chunks::ID).unwrap().apply(&mut ctx).unwrap();
    drop(ctx);

    assert_eq!(sums.into_inner::<f32>().unwrap(), vec![2.0, 4.0, 6.0]);
    assert_eq!(count.into_inner::<usize>().unwrap(), 3);
}
