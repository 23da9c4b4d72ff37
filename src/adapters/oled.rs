//! Real hardware adapters: `/dev/i2c` bus access and SSD1306 surfaces.
//!
//! Only compiled with the `hw` feature.  Each [`OledSurface`] opens its own
//! handle on the shared `/dev/i2c-1` character device — the kernel
//! serializes the transactions, and channel exclusivity is the
//! [`MuxPair`](crate::mux::MuxPair)'s job, so the controllers can all sit at
//! 0x3C without colliding.

use embedded_graphics::mono_font::ascii::{FONT_5X8, FONT_6X10, FONT_7X13_BOLD};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};
use linux_embedded_hal::I2cdev;
use ssd1306::mode::BufferedGraphicsMode;
use ssd1306::prelude::*;
use ssd1306::{I2CDisplayInterface, Ssd1306};

use crate::error::{BusError, DisplayError};
use crate::ports::{BusPort, FontSize, FrameSurface};

/// Display width in pixels (all panels are 128×32).
const WIDTH: i32 = 128;

// ───────────────────────────────────────────────────────────────
// Bus
// ───────────────────────────────────────────────────────────────

/// [`BusPort`] over a Linux I2C character device.
pub struct LinuxI2cBus {
    dev: I2cdev,
}

impl LinuxI2cBus {
    pub fn open(path: &str) -> Result<Self, crate::error::Error> {
        let dev = I2cdev::new(path).map_err(|_| crate::error::Error::Init("i2c open failed"))?;
        Ok(Self { dev })
    }
}

impl BusPort for LinuxI2cBus {
    fn write_byte(&mut self, addr: u8, value: u8) -> Result<(), BusError> {
        use embedded_hal::i2c::I2c;
        self.dev.write(addr, &[value]).map_err(|_| BusError::Io)
    }

    fn probe(&mut self, addr: u8) -> bool {
        use embedded_hal::i2c::I2c;
        // Single-byte read ack test, same probe the bus scan tools use.
        let mut buf = [0u8; 1];
        self.dev.read(addr, &mut buf).is_ok()
    }
}

// ───────────────────────────────────────────────────────────────
// Surface
// ───────────────────────────────────────────────────────────────

type Controller = Ssd1306<
    I2CInterface<I2cdev>,
    DisplaySize128x32,
    BufferedGraphicsMode<DisplaySize128x32>,
>;

/// [`FrameSurface`] over one SSD1306 controller in buffered-graphics mode.
pub struct OledSurface {
    display: Controller,
}

impl OledSurface {
    /// Open a fresh device handle for this surface.  The correct expander
    /// channel must be selected before [`FrameSurface::init`] is called.
    pub fn open(path: &str, addr: u8) -> Result<Self, crate::error::Error> {
        let dev = I2cdev::new(path).map_err(|_| crate::error::Error::Init("i2c open failed"))?;
        let interface = I2CDisplayInterface::new_custom_address(dev, addr);
        let display = Ssd1306::new(interface, DisplaySize128x32, DisplayRotation::Rotate0)
            .into_buffered_graphics_mode();
        Ok(Self { display })
    }

    fn font(size: FontSize) -> &'static MonoFont<'static> {
        match size {
            FontSize::Small => &FONT_5X8,
            FontSize::Regular => &FONT_6X10,
            FontSize::Large => &FONT_7X13_BOLD,
        }
    }
}

impl FrameSurface for OledSurface {
    fn init(&mut self) -> Result<(), DisplayError> {
        self.display.init().map_err(|_| DisplayError::InitFailed)?;
        self.display.clear(BinaryColor::Off).map_err(|_| DisplayError::InitFailed)?;
        self.display.flush().map_err(|_| DisplayError::InitFailed)
    }

    fn clear(&mut self) {
        let _ = self.display.clear(BinaryColor::Off);
    }

    fn draw_text(&mut self, x: i32, y: i32, text: &str, font: FontSize) {
        let style = MonoTextStyle::new(Self::font(font), BinaryColor::On);
        let _ = Text::with_baseline(text, Point::new(x, y), style, Baseline::Top)
            .draw(&mut self.display);
    }

    fn draw_text_centered(&mut self, y: i32, text: &str, font: FontSize) {
        let glyph = Self::font(font).character_size.width as i32;
        let x = (WIDTH - glyph * text.len() as i32).max(0) / 2;
        self.draw_text(x, y, text, font);
    }

    fn draw_progress_bar(&mut self, x: i32, y: i32, w: u32, h: u32, value: f32, max: f32) {
        let outline = Rectangle::new(Point::new(x, y), Size::new(w, h))
            .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1));
        let _ = outline.draw(&mut self.display);

        if value > 0.0 && max > 0.0 {
            let fill = ((value / max).clamp(0.0, 1.0) * (w.saturating_sub(2)) as f32) as u32;
            if fill > 0 {
                let bar = Rectangle::new(Point::new(x + 1, y + 1), Size::new(fill, h.saturating_sub(2)))
                    .into_styled(PrimitiveStyle::with_fill(BinaryColor::On));
                let _ = bar.draw(&mut self.display);
            }
        }
    }

    fn push(&mut self) -> Result<(), DisplayError> {
        self.display.flush().map_err(|_| DisplayError::PushFailed)
    }
}
