use crate::test::fixtures::{f32_buffer, f32_zeros};
use crate::{Arg, ArgKind, ArgumentContext, Buffer, Direction, Error, OpaqueRef, OutArg, Scalar, SequenceRef};

#[test]
fn test_inputs_keep_insertion_order() {
    let a = f32_buffer(&[1], &[1.0]);
    let b = f32_buffer(&[1], &[2.0]);
    let ctx = ArgumentContext::new().with_input(&a).with_input(&b).with_input(Scalar::all(3.0));

    assert_eq!(ctx.input_count(), 3);
    assert_eq!(ctx.in_buffer(0).unwrap().to_vec::<f32>().unwrap(), vec![1.0]);
    assert_eq!(ctx.in_buffer(1).unwrap().to_vec::<f32>().unwrap(), vec![2.0]);
    assert_eq!(ctx.in_scalar(2).unwrap(), Scalar::all(3.0));
    assert_eq!(ctx.inputs().kinds().collect::<Vec<_>>(), vec![ArgKind::Buffer, ArgKind::Buffer, ArgKind::Scalar]);
}

#[test]
fn test_in_arg_reinterprets_by_payload_type() {
    let buffer = f32_buffer(&[2], &[1.0, 2.0]);
    let seq = SequenceRef::new(vec![1i64, 2, 3]);
    let level = 7i32;
    let ctx = ArgumentContext::new().with_input(&buffer).with_input(&seq).with_value(&level);

    assert_eq!(ctx.in_arg::<Buffer>(0).unwrap().data_addr(), buffer.data_addr());
    assert_eq!(ctx.in_arg::<SequenceRef>(1).unwrap().rref::<i64>().unwrap(), &vec![1, 2, 3]);
    assert_eq!(*ctx.in_arg::<i32>(2).unwrap(), 7);
    assert_eq!(*ctx.in_value::<i32>(2).unwrap(), 7);
}

#[test]
fn test_in_arg_type_mismatch() {
    let level = 7i32;
    let ctx = ArgumentContext::new().with_value(&level);

    let err = ctx.in_arg::<f64>(0).unwrap_err();
    assert!(matches!(
        err,
        Error::TypeMismatch { direction: Direction::Input, index: 0, expected: "f64", actual: "i32" }
    ));
}

#[test]
fn test_input_index_out_of_range() {
    let buffer = f32_zeros(&[1]);
    let ctx = ArgumentContext::new().with_input(&buffer);

    let err = ctx.in_buffer(3).unwrap_err();
    assert!(matches!(err, Error::IndexOutOfRange { direction: Direction::Input, index: 3, len: 1 }));
}

#[test]
fn test_scalar_accessor_on_buffer_input() {
    let buffer = f32_zeros(&[1]);
    let ctx = ArgumentContext::new().with_input(&buffer);

    let err = ctx.in_scalar(0).unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { direction: Direction::Input, index: 0, expected: "scalar", .. }));
}

#[test]
fn test_sequence_and_opaque_inputs() {
    let seq = SequenceRef::new(vec![1.5f32, 2.5]);
    let opaque = OpaqueRef::new(String::from("roi"));
    let ctx = ArgumentContext::new().with_input(&seq).with_input(&opaque);

    assert_eq!(ctx.in_sequence::<f32>(0).unwrap(), &[1.5, 2.5]);
    assert_eq!(ctx.in_opaque::<String>(1).unwrap(), "roi");
    assert!(matches!(ctx.in_sequence::<f64>(0), Err(Error::TypeMismatch { index: 0, .. })));
    assert!(matches!(ctx.in_opaque::<i32>(1), Err(Error::TypeMismatch { index: 1, .. })));
}

#[test]
fn test_outputs_write_through() {
    let mut buffer = f32_zeros(&[2]);
    let mut scalar = Scalar::default();
    let mut seq = SequenceRef::empty::<u8>();
    let mut opaque = OpaqueRef::new(0usize);
    let addr = buffer.data_addr();

    {
        let mut ctx = ArgumentContext::new()
            .with_output(0, &mut buffer)
            .with_output(1, &mut scalar)
            .with_output(2, &mut seq)
            .with_output(3, &mut opaque);
        assert_eq!(ctx.output_count(), 4);

        ctx.out_buffer(0).unwrap().fill(4.0f32).unwrap();
        ctx.out_scalar(1).unwrap()[2] = 9.0;
        ctx.out_sequence::<u8>(2).unwrap().extend([1, 2, 3]);
        *ctx.out_opaque::<usize>(3).unwrap() = 42;
    }

    assert_eq!(buffer.data_addr(), addr);
    assert_eq!(buffer.to_vec::<f32>().unwrap(), vec![4.0, 4.0]);
    assert_eq!(scalar, Scalar::new(0.0, 0.0, 9.0, 0.0));
    assert_eq!(seq.into_inner::<u8>().unwrap(), vec![1, 2, 3]);
    assert_eq!(opaque.into_inner::<usize>().unwrap(), 42);
}

#[test]
fn test_output_errors() {
    let mut buffer = f32_zeros(&[2]);
    let mut seq = SequenceRef::empty::<u8>();
    let mut ctx = ArgumentContext::new().with_output(0, &mut buffer).with_output(1, &mut seq);

    assert!(matches!(ctx.out_scalar(0), Err(Error::TypeMismatch { direction: Direction::Output, index: 0, .. })));
    assert!(matches!(ctx.out_sequence::<u16>(1), Err(Error::TypeMismatch { direction: Direction::Output, .. })));
    assert!(matches!(ctx.out_buffer(5), Err(Error::IndexOutOfRange { direction: Direction::Output, index: 5, .. })));
}

#[test]
fn test_slots_are_borrowed_in_index_order() {
    let mut buffer = f32_zeros(&[2]);
    let mut scalar = Scalar::default();
    let mut ctx = ArgumentContext::new().with_output(1, &mut buffer).with_output(0, &mut scalar);
    let outputs = ctx.outputs_mut();

    let [first, second, third] = outputs.slots_mut();
    assert!(matches!(first, Some(OutArg::Scalar(_))));
    assert!(matches!(second, Some(OutArg::Buffer(_))));
    assert!(third.is_none());
    assert_eq!(outputs.len(), 2);
}

#[test]
fn test_bind_output_returns_previous_slot() {
    let mut first = f32_zeros(&[1]);
    let mut second = Scalar::default();
    let mut ctx = ArgumentContext::new();

    assert!(ctx.bind_output(0, &mut first).is_none());
    let previous = ctx.bind_output(0, &mut second);
    assert!(matches!(previous, Some(OutArg::Buffer(_))));
    assert_eq!(ctx.output_count(), 1);
}

#[test]
fn test_arg_type_names() {
    let seq = SequenceRef::new(vec![0u16]);
    let value = 1.0f64;

    assert_eq!(Arg::from(&seq).type_name(), std::any::type_name::<Vec<u16>>());
    assert_eq!(Arg::value(&value).type_name(), "f64");
    assert_eq!(Arg::value(&value).kind(), ArgKind::Value);
}
