use anyhow::Context;
use clap::Parser;
use easel_canvas::canvas::Canvas;
use easel_canvas::manager::BatchManager;
use easel_canvas::surface::{DrawingSurface, FillRule};
use easel_canvas::transport::RecordingTransport;
use easel_protocol::args::Scalar;
use easel_protocol::attributes::attribute_name;
use easel_protocol::decode::{decode_message, DecodedArg, DecodedEntry};
use easel_protocol::message::OutboundMessage;
use easel_protocol::opcodes::PROTOCOL_VERSION;
use easel_shared::types::Size;
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::f64::consts::PI;

#[derive(Debug, Parser)]
#[clap(
    name = "easel-inspect",
    version = "0.1.0",
    author = "Easel",
    about = "Draws a demo scene and prints the messages it produces"
)]
struct Cli {
    /// Number of circles in the scene
    #[clap(short = 'c', long = "circles", default_value_t = 3)]
    circles: usize,

    /// Send every command on its own instead of batching the scene
    #[clap(short = 'i', long = "immediate")]
    immediate: bool,

    /// Also print the raw JSON command stream of every message
    #[clap(short = 'r', long = "raw")]
    raw: bool,

    #[clap(short = 'd', long = "debug")]
    debug: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    SimpleLogger::new().with_level(level).init()?;

    let transport = RecordingTransport::new();
    let manager = BatchManager::shared(transport.clone());
    let canvas = Canvas::with_size(&manager, Size::new(400, 300));

    if cli.immediate {
        draw_scene(&canvas, cli.circles)?;
    } else {
        let guard = canvas.hold();
        draw_scene(&canvas, cli.circles)?;
        guard.release()?;
    }

    println!(
        "protocol version {PROTOCOL_VERSION}, {} message(s)",
        transport.len()
    );
    for (index, message) in transport.messages().iter().enumerate() {
        print_message(index, message, cli.raw)?;
    }

    Ok(())
}

fn draw_scene(canvas: &Canvas, circles: usize) -> anyhow::Result<()> {
    let size = canvas.size().f64();

    canvas.set_fill_style("#f0f0f0")?;
    canvas.fill_rect(0, 0, canvas.width(), canvas.height())?;

    // circles spread on a spiral, so the scene is the same on every run
    let (mut xs, mut ys, mut radii) = (Vec::new(), Vec::new(), Vec::new());
    for index in 0..circles {
        let angle = index as f64 * 0.7 * PI;
        let distance = 10.0 + index as f64 * 6.0;
        xs.push((size.width / 2.0 + angle.cos() * distance) as f32);
        ys.push((size.height / 2.0 + angle.sin() * distance) as f32);
        radii.push(4.0 + (index % 5) as f32);
    }
    canvas.set_fill_style("rgba(30, 90, 200, 0.8)")?;
    canvas.fill_circles(xs, ys, radii)?;

    canvas.set_stroke_style("darkslategray")?;
    canvas.set_line_width(2.0)?;
    canvas.begin_path()?;
    canvas.move_to(20, 20)?;
    canvas.line_to(size.width - 20.0, 20)?;
    canvas.line_to(size.width / 2.0, size.height - 20.0)?;
    canvas.close_path()?;
    canvas.stroke()?;
    canvas.fill(FillRule::NonZero)?;

    canvas.set_font("16px sans-serif")?;
    canvas.fill_text("easel", 10, size.height - 10.0, None)?;
    Ok(())
}

fn print_message(index: usize, message: &OutboundMessage, raw: bool) -> anyhow::Result<()> {
    println!(
        "message {index}: {} byte command stream, {} argument buffer(s)",
        message.command_stream().len(),
        message.arg_buffers().len()
    );

    if raw {
        let stream = std::str::from_utf8(message.command_stream())
            .context("command stream is not valid utf-8")?;
        println!("  {stream}");
    }

    for entry in decode_message(message)? {
        println!("  {}", describe(&entry));
    }
    Ok(())
}

fn describe(entry: &DecodedEntry) -> String {
    match entry {
        DecodedEntry::Draw { opcode, args } => {
            let args = args.iter().map(describe_arg).collect::<Vec<_>>();
            format!("{opcode}({})", args.join(", "))
        }
        DecodedEntry::Switch(surface) => format!("switchCanvas({surface})"),
        DecodedEntry::Set { attribute, value } => {
            let name = attribute_name(*attribute).unwrap_or("unknown");
            format!("set {name} = {}", describe_scalar(value))
        }
    }
}

fn describe_arg(arg: &DecodedArg) -> String {
    match arg {
        DecodedArg::Scalar(scalar) => describe_scalar(scalar),
        DecodedArg::Array(array) => format!("{}{:?}", array.dtype(), array.shape()),
    }
}

fn describe_scalar(scalar: &Scalar) -> String {
    match scalar {
        Scalar::Null => "null".to_string(),
        Scalar::Bool(value) => value.to_string(),
        Scalar::Int(value) => value.to_string(),
        Scalar::Float(value) => value.to_string(),
        Scalar::Str(value) => format!("{value:?}"),
    }
}
