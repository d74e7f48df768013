//! Wall gate firmware: main entry point.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                  Adapters (outer ring)                    │
//! │                                                           │
//! │  HardwareAdapter        LogEventSink     UartTransport    │
//! │  (RegisterBus + Clock)  (EventSink)      (Transport)      │
//! │                                                           │
//! │  ─────────────── Port Trait Boundary ──────────────────   │
//! │                                                           │
//! │  ┌─────────────────────────────────────────────────────┐  │
//! │  │  SerialLink ──▶ GateService ──▶ Conductor           │  │
//! │  └─────────────────────────────────────────────────────┘  │
//! └───────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::{FreeRtos, NON_BLOCK};
use esp_idf_hal::gpio::AnyIOPin;
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::sys::EspError;
use esp_idf_hal::uart::{UartConfig, UartDriver};
use esp_idf_hal::units::Hertz;
use log::{info, warn};

use wallgate::adapters::{HardwareAdapter, LogEventSink, MonotonicClock};
use wallgate::app::service::GateService;
use wallgate::config::GateConfig;
use wallgate::drivers::Cy8c95xx;
use wallgate::pins;
use wallgate::serial::{SerialLink, Transport};

// ── UART transport ────────────────────────────────────────────

struct UartTransport<'d>(UartDriver<'d>);

impl Transport for UartTransport<'_> {
    type Error = EspError;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, EspError> {
        self.0.read(buf, NON_BLOCK)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, EspError> {
        self.0.write(data)
    }

    fn flush(&mut self) -> Result<(), EspError> {
        self.0.wait_tx_done(esp_idf_hal::delay::BLOCK)
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("WallGate v{}", env!("CARGO_PKG_VERSION"));

    let config = GateConfig::default();
    config.validate()?;

    // ── 2. Peripherals ────────────────────────────────────────
    let peripherals = Peripherals::take()?;

    // SAFETY: each GPIO number is claimed exactly once, here.
    let (sda, scl, tx, rx) = unsafe {
        (
            AnyIOPin::new(pins::I2C_SDA_GPIO),
            AnyIOPin::new(pins::I2C_SCL_GPIO),
            AnyIOPin::new(pins::UART_TX_GPIO),
            AnyIOPin::new(pins::UART_RX_GPIO),
        )
    };

    let i2c_config = I2cConfig::new().baudrate(Hertz(pins::I2C_FREQ_HZ));
    let i2c = I2cDriver::new(peripherals.i2c0, sda, scl, &i2c_config)?;

    let uart_config = UartConfig::new().baudrate(Hertz(config.serial.baud_rate));
    let uart = UartDriver::new(
        peripherals.uart1,
        tx,
        rx,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &uart_config,
    )?;

    // ── 3. Wire adapters to the core ──────────────────────────
    let mut hw = HardwareAdapter::new(Cy8c95xx::new(i2c), MonotonicClock::new());
    let mut sink = LogEventSink::new();
    let mut link = SerialLink::new(UartTransport(uart), &config.serial);
    let mut service = GateService::new(config);

    info!("Waiting for host commands");

    // ── 4. Main loop ──────────────────────────────────────────
    loop {
        if let Err(e) = link.poll(&mut service, &mut hw, &mut sink) {
            warn!("Serial link error: {:?}", e);
        }
        FreeRtos::delay_ms(1);
    }
}
