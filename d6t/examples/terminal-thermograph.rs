use std::env;
use std::io::{self, Stdout, Write};
use std::path::Path;

use anyhow::bail;
use d6t::{
    BufferSelect, Color, ColorFrame, D6t44l, DisplaySink, Layer, Thermograph, ThermographConfig,
};
use linux_embedded_hal::{Delay, I2cdev};

/// The widest grid drawn in the terminal, in cells. Finer grids are subsampled.
const MAX_COLUMNS: usize = 40;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        bail!("One argument required: <I2C bus>");
    }
    let bus = I2cdev::new(Path::new(&args[1]))?;
    let mut delay = Delay;
    let mut sensor = D6t44l::new(bus);
    sensor.setup(&mut delay);
    let mut thermograph = Thermograph::new(ThermographConfig::default())?;
    let mut terminal = TerminalSink::new();
    print!("\x1b[2J");
    loop {
        thermograph.step(&mut sensor, &mut delay, &mut terminal)?;
        if let Some(frame) = sensor.last_frame() {
            print!("{}", frame);
        }
    }
}

/// Draws frames with ANSI true-color escapes, two spaces per cell.
struct TerminalSink {
    out: Stdout,
}

impl TerminalSink {
    fn new() -> Self {
        Self { out: io::stdout() }
    }
}

/// Scale a 4-bit channel by a 4-bit alpha (over black) up to 8 bits.
fn blend(channel: u8, alpha: u8) -> u16 {
    u16::from(channel) * 17 * u16::from(alpha) / 15
}

fn write_cell<W: Write>(out: &mut W, color: Color) -> io::Result<()> {
    let alpha = color.alpha().value();
    write!(
        out,
        "\x1b[48;2;{};{};{}m  ",
        blend(color.red(), alpha),
        blend(color.green(), alpha),
        blend(color.blue(), alpha)
    )
}

impl DisplaySink for TerminalSink {
    type Error = io::Error;

    fn present(
        &mut self,
        layer: Layer,
        buffer: BufferSelect,
        frame: &ColorFrame,
    ) -> Result<(), Self::Error> {
        let mut out = self.out.lock();
        write!(out, "\x1b[H")?;
        writeln!(
            out,
            "{} (layer {}, buffer {:?})\x1b[K",
            frame.caption(),
            layer.index(),
            buffer
        )?;
        let resolution = frame.resolution();
        let step = (resolution.width() + MAX_COLUMNS - 1) / MAX_COLUMNS;
        for y in (0..resolution.height()).step_by(step) {
            for x in (0..resolution.width()).step_by(step) {
                write_cell(&mut out, frame.cell(x, y))?;
            }
            writeln!(out, "\x1b[0m\x1b[K")?;
        }
        write!(out, "\x1b[0m\x1b[J")?;
        out.flush()
    }
}
