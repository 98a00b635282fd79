//! GPIO / peripheral pin assignments for the d-flux node (ESP32 DevKit).
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Status LED
// ---------------------------------------------------------------------------

/// On-board blue LED.  Blinks while waiting for a controller.
pub const LED_GPIO: i32 = 2;

// ---------------------------------------------------------------------------
// Servo (continuous-rotation, spins the sampling inlet)
// ---------------------------------------------------------------------------

/// LEDC PWM output for the servo signal line.
pub const SERVO_GPIO: i32 = 12;

// ---------------------------------------------------------------------------
// I²C bus (SCD30)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 21;
pub const I2C_SCL_GPIO: i32 = 22;
/// SCD30 supports at most 100 kHz and uses clock stretching.
pub const I2C_BAUDRATE_HZ: u32 = 50_000;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC channel driving the servo.
pub const SERVO_LEDC_CHANNEL: u32 = 0;
/// LEDC timer resolution (bits) for the servo channel.
pub const SERVO_PWM_RESOLUTION_BITS: u32 = 16;
/// Standard hobby-servo frame rate.
pub const SERVO_PWM_FREQ_HZ: u32 = 50;
