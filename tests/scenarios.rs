use easel::prelude::*;
use easel::protocol::args::Scalar;
use easel::protocol::array::{ArrayData, DType};
use easel::protocol::decode::{decode_message, DecodedArg, DecodedEntry};
use easel::protocol::opcodes::Opcode;
use serde_json::{json, Value};
use test_case::test_case;

fn setup() -> (ManagerHandle, RecordingTransport) {
    let transport = RecordingTransport::new();
    (BatchManager::shared(transport.clone()), transport)
}

fn stream_json(transport: &RecordingTransport, index: usize) -> Value {
    let messages = transport.messages();
    serde_json::from_slice(messages[index].command_stream()).unwrap()
}

#[test]
fn fill_rect_batch() {
    let (manager, transport) = setup();
    let canvas = Canvas::with_size(&manager, Size::new(100, 100));

    let guard = canvas.hold();
    canvas.fill_rect(10, 10, 20, 20).unwrap();
    canvas.fill_rect(40, 40, 15, 15).unwrap();
    guard.release().unwrap();

    assert_eq!(transport.len(), 1);
    let message = &transport.messages()[0];
    assert!(message.arg_buffers().is_empty());
    assert_eq!(message.metadata.dtype, DType::Uint8);
    assert_eq!(message.metadata.shape, vec![message.command_stream().len()]);

    let switch = format!("IPY_MODEL_{}", canvas.id());
    assert_eq!(
        stream_json(&transport, 0),
        json!([[59, [switch]], [0, [10, 10, 20, 20], 0], [0, [40, 40, 15, 15], 0]])
    );
}

#[test]
fn fill_circles_descriptors() {
    let (manager, transport) = setup();
    let canvas = Canvas::with_size(&manager, Size::new(100, 100));

    canvas
        .fill_circles(
            vec![1.0f32, 2.0, 3.0],
            vec![4.0f32, 5.0, 6.0],
            vec![7.0f32, 8.0, 9.0],
        )
        .unwrap();

    // the immediate switch went out first
    assert_eq!(transport.len(), 2);
    assert_eq!(
        stream_json(&transport, 1),
        json!([11, [
            {"shape": [3], "dtype": "float32", "idx": 0},
            {"shape": [3], "dtype": "float32", "idx": 1},
            {"shape": [3], "dtype": "float32", "idx": 2}
        ], 3])
    );

    let entries = decode_message(&transport.messages()[1]).unwrap();
    let DecodedEntry::Draw { opcode, args } = &entries[0] else {
        panic!("expected a draw entry");
    };
    assert_eq!(*opcode, Opcode::FillCircles);
    let expected = [[1.0f32, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];
    for (arg, values) in args.iter().zip(expected) {
        let DecodedArg::Array(array) = arg else {
            panic!("expected an array argument");
        };
        assert_eq!(array.data(), &ArrayData::Float32(values.to_vec()));
    }
}

#[test]
fn nested_holds_send_once() {
    let (manager, transport) = setup();
    let canvas = Canvas::with_size(&manager, Size::new(100, 100));

    let outer = hold(&manager);
    canvas.fill_rect(0, 0, 1, 1).unwrap();
    {
        let _inner = canvas.hold();
        canvas.fill_rect(1, 1, 1, 1).unwrap();
    }
    assert!(transport.is_empty());
    canvas.fill_rect(2, 2, 1, 1).unwrap();
    outer.release().unwrap();

    assert_eq!(transport.len(), 1);
    let entries = transport.decoded().unwrap().remove(0);
    assert_eq!(entries.len(), 4);
    assert_eq!(
        entries.iter().filter(|entry| matches!(entry, DecodedEntry::Switch(_))).count(),
        1
    );
}

fn polygon_buffers(points: PointSet) -> Vec<easel::protocol::message::OutboundMessage> {
    let (manager, transport) = setup();
    let canvas = Canvas::with_size(&manager, Size::new(100, 100));
    canvas.fill_polygons(&points).unwrap();
    transport.take()
}

#[test]
fn polygon_input_forms_are_equivalent() {
    let coords = vec![0.0f64, 0.0, 4.0, 0.0, 4.0, 3.0, 10.0, 10.0, 12.0, 10.0, 12.0, 12.0];

    let items = PointSet::Items(vec![
        NdArray::new(vec![3, 2], coords[..6].to_vec()).unwrap(),
        NdArray::new(vec![3, 2], coords[6..].to_vec()).unwrap(),
    ]);
    let flat = PointSet::Flat {
        points: NdArray::new(vec![6, 2], coords.clone()).unwrap(),
        counts: NdArray::from(vec![3i32, 3]),
    };
    let uniform = PointSet::Uniform(NdArray::new(vec![2, 3, 2], coords).unwrap());

    let from_items = polygon_buffers(items);
    let from_flat = polygon_buffers(flat);
    let from_uniform = polygon_buffers(uniform);

    // surfaces have different ids, so only the drawing message is compared
    assert_eq!(from_items[1], from_flat[1]);
    assert_eq!(from_items[1], from_uniform[1]);
    assert_eq!(from_items[1].arg_buffers().len(), 2);
}

#[test_case(vec![3, 2], 1 ; "second polygon too small")]
#[test_case(vec![1, 3], 0 ; "first polygon too small")]
fn polygon_minimum_points(counts: Vec<i32>, offending: usize) {
    let (manager, transport) = setup();
    let canvas = Canvas::with_size(&manager, Size::new(100, 100));
    let total: i32 = counts.iter().sum();
    let points = PointSet::Flat {
        points: NdArray::new(vec![total as usize, 2], vec![0.0f64; total as usize * 2]).unwrap(),
        counts: NdArray::from(counts),
    };

    let err = canvas.fill_polygons(&points).unwrap_err();
    assert!(err.to_string().contains(&format!("item {offending}")), "{err}");
    assert!(transport.is_empty());
}

#[test]
fn surfaces_share_a_manager() {
    let (manager, transport) = setup();
    let plain = Canvas::with_size(&manager, Size::new(100, 100));
    let rough = RoughCanvas::with_size(&manager, Size::new(100, 100));

    {
        let _hold = hold(&manager);
        plain.fill_rect(0, 0, 5, 5).unwrap();
        rough.set_roughness(3.0).unwrap();
        rough.fill_rect(0, 0, 5, 5).unwrap();
        plain.clear().unwrap();
    }

    let entries = transport.decoded().unwrap().remove(0);
    let opcodes: Vec<Opcode> = entries.iter().map(DecodedEntry::opcode).collect();
    assert_eq!(
        opcodes,
        vec![
            Opcode::SwitchCanvas,
            Opcode::FillRect,
            Opcode::SwitchCanvas,
            Opcode::Set,
            Opcode::FillRect,
            Opcode::SwitchCanvas,
            Opcode::Clear,
        ]
    );
    assert_eq!(
        entries[3],
        DecodedEntry::Set {
            attribute: 101,
            value: Scalar::Float(3.0)
        }
    );
}

#[test]
fn failed_send_is_not_retried() {
    let (manager, transport) = setup();
    let canvas = Canvas::with_size(&manager, Size::new(100, 100));

    transport.set_failing(true);
    let guard = canvas.hold();
    canvas.fill_rect(0, 0, 1, 1).unwrap();
    assert!(matches!(guard.release(), Err(CanvasError::Transport(_))));

    transport.set_failing(false);
    canvas.flush().unwrap();
    assert!(transport.is_empty());

    canvas.fill_rect(5, 5, 1, 1).unwrap();
    assert_eq!(transport.len(), 2);
}
