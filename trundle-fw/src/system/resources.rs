//! Hardware resource assignment
//!
//! Splits the RP2350 peripherals into per-device groups so each driver or
//! task owns exactly the pins it needs. The I2C bus is the one genuinely
//! shared resource (inertial sensor and display live on it); it is wrapped in
//! a mutex and handed out as a `'static` reference.
//!
//! # Pin map
//! - Motor driver (TB6612FNG): dir 2/3 + PWM 4 (left), dir 5/6 + PWM 7
//!   (right), standby 8
//! - Buzzer: PWM on 9
//! - RGB strip (WS2812, 2 pixels): 10 via PIO0
//! - Ultrasonic ranger (HC-SR04): trigger 11, echo 12
//! - Line array multiplexer: select 13/14/15, analog out on ADC0 (26)
//! - Ambient light: ADC1 (27) left, ADC2 (28) right
//! - Buttons: 18-21, active low
//! - I2C0: SDA 16, SCL 17 (MPU6050 + SSD1306)

use assign_resources::assign_resources;
use embassy_rp::bind_interrupts;
use embassy_rp::i2c::{Async as I2cAsync, Config as I2cConfig, I2c, InterruptHandler as I2cInterruptHandler};
use embassy_rp::peripherals::{self, I2C0, PIN_16, PIN_17, PIO0};
use embassy_rp::pio::InterruptHandler as PioInterruptHandler;
use embassy_rp::Peri;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use static_cell::StaticCell;

assign_resources! {
    motor: MotorResources {
        left_forward_pin: PIN_2,
        left_backward_pin: PIN_3,
        left_slice: PWM_SLICE2,
        left_pwm_pin: PIN_4,
        right_forward_pin: PIN_5,
        right_backward_pin: PIN_6,
        right_slice: PWM_SLICE3,
        right_pwm_pin: PIN_7,
        standby_pin: PIN_8,
    },
    buzzer: BuzzerResources {
        slice: PWM_SLICE4,
        pin: PIN_9,
    },
    led_strip: LedStripResources {
        pio: PIO0,
        dma: DMA_CH0,
        pin: PIN_10,
    },
    distance: DistanceSensorResources {
        trigger_pin: PIN_11,
        echo_pin: PIN_12,
    },
    line_array: LineArrayResources {
        select0: PIN_13,
        select1: PIN_14,
        select2: PIN_15,
        mux_out: PIN_26,
    },
    ambient: AmbientLightResources {
        left_pin: PIN_27,
        right_pin: PIN_28,
    },
    buttons: ButtonResources {
        a: PIN_18,
        b: PIN_19,
        c: PIN_20,
        d: PIN_21,
    },
    adc: AdcResources {
        adc: ADC,
    },
    flash: FlashResources {
        flash: FLASH,
    },
}

bind_interrupts!(pub struct Irqs {
    I2C0_IRQ => I2cInterruptHandler<I2C0>;
    PIO0_IRQ_0 => PioInterruptHandler<PIO0>;
});

/// The shared I2C bus carrying the inertial sensor and the display
pub type I2cBus = Mutex<CriticalSectionRawMutex, I2c<'static, I2C0, I2cAsync>>;

static I2C_BUS: StaticCell<I2cBus> = StaticCell::new();

/// Bring up the I2C bus in fast mode. Call once from main before spawning
/// any task that uses the bus.
pub fn init_i2c(
    i2c: Peri<'static, I2C0>,
    scl: Peri<'static, PIN_17>,
    sda: Peri<'static, PIN_16>,
) -> &'static I2cBus {
    let mut config = I2cConfig::default();
    config.frequency = 400_000;
    let bus = I2c::new_async(i2c, scl, sda, Irqs, config);
    I2C_BUS.init(Mutex::new(bus))
}
