use serde_json::{json, Value};

use crate::envelope::{DateTime, TimeUnit};
use crate::error::RectError;

/// Direction of a GPIO pin.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GpioDirection {
    Input,
    Output,
}

impl GpioDirection {
    fn wire_name(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }
}

/// Value applied to a GPIO pin.
///
/// `Low`/`High` are output levels and pair with [`GpioDirection::Output`];
/// `PullDisabled`/`PullEnabled` are input pull configurations and pair with
/// [`GpioDirection::Input`]. The pairing is checked by [`Action::gpio`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GpioValue {
    Low,
    High,
    PullDisabled,
    PullEnabled,
}

impl GpioValue {
    fn wire_name(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::High => "high",
            Self::PullDisabled => "disabled",
            Self::PullEnabled => "enabled",
        }
    }

    fn is_output_level(self) -> bool {
        matches!(self, Self::Low | Self::High)
    }
}

/// UART baud rate supported by the board.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UartBaudRate {
    B9600,
    B19200,
    B38400,
    B57600,
    B115200,
    B230400,
    B460800,
    B921600,
}

impl UartBaudRate {
    fn bits_per_second(self) -> u32 {
        match self {
            Self::B9600 => 9_600,
            Self::B19200 => 19_200,
            Self::B38400 => 38_400,
            Self::B57600 => 57_600,
            Self::B115200 => 115_200,
            Self::B230400 => 230_400,
            Self::B460800 => 460_800,
            Self::B921600 => 921_600,
        }
    }
}

/// UART parity mode.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UartParity {
    None,
    Even,
    Odd,
}

impl UartParity {
    fn wire_name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Even => "even",
            Self::Odd => "odd",
        }
    }
}

/// SPI bus speed level.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SpiSpeed {
    Low,
    Medium,
    High,
    Max,
}

impl SpiSpeed {
    fn wire_name(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Max => "max",
        }
    }
}

/// SPI sample mode (clock polarity/phase combination).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SpiMode {
    Mode0,
    Mode1,
    Mode2,
    Mode3,
}

impl SpiMode {
    fn wire_name(self) -> &'static str {
        match self {
            Self::Mode0 => "mode0",
            Self::Mode1 => "mode1",
            Self::Mode2 => "mode2",
            Self::Mode3 => "mode3",
        }
    }
}

/// SPI bit order.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BitOrder {
    MsbFirst,
    LsbFirst,
}

impl BitOrder {
    fn wire_name(self) -> &'static str {
        match self {
            Self::MsbFirst => "msb",
            Self::LsbFirst => "lsb",
        }
    }
}

/// I2C bus speed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum I2cSpeed {
    Standard,
    Fast,
    FastPlus,
}

impl I2cSpeed {
    fn wire_name(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Fast => "fast",
            Self::FastPlus => "fast-plus",
        }
    }
}

/// ADC voltage reference source.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AdcReference {
    Internal,
    External,
}

impl AdcReference {
    fn wire_name(self) -> &'static str {
        match self {
            Self::Internal => "internal",
            Self::External => "external",
        }
    }
}

/// One validated peripheral operation, ready to be attached to an event.
///
/// Values are created through the per-peripheral constructors ([`Action::gpio`],
/// [`Action::i2c_read`], ...) which reject invalid parameter combinations, so
/// every `Action` in existence serializes to a well-formed wire field list.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Action {
    kind: ActionKind,
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum ActionKind {
    Gpio {
        pin: u32,
        direction: GpioDirection,
        value: GpioValue,
    },
    Uart {
        baud: UartBaudRate,
        parity: UartParity,
        stop_bits: u8,
        data_bits: u8,
        rx_timeout_ms: u32,
        rx_len: u32,
        tx_data: Vec<u8>,
    },
    Spi {
        speed: SpiSpeed,
        cs_pin: u32,
        mode: SpiMode,
        bit_order: BitOrder,
        rx_len: u32,
        tx_data: Vec<u8>,
    },
    I2cRead {
        speed: I2cSpeed,
        address: u8,
        register: u8,
        length: u32,
    },
    I2cWrite {
        speed: I2cSpeed,
        address: u8,
        register: u8,
        data: Vec<u8>,
    },
    Adc {
        channel: u32,
        reference: AdcReference,
    },
    PwmEnable {
        timer: u32,
        unit: TimeUnit,
        period: u32,
        duty: [u32; 3],
        duration: u32,
    },
    PwmDisable {
        timer: u32,
    },
    FileRead {
        name: String,
    },
    FileWrite {
        name: String,
        content: String,
    },
    RtcRead,
    RtcWrite {
        time: DateTime,
    },
}

impl Action {
    /// Drive or configure a GPIO pin.
    ///
    /// An `Output` direction requires a level value (`Low`/`High`); an `Input`
    /// direction requires a pull value (`PullDisabled`/`PullEnabled`).
    pub fn gpio(pin: u32, direction: GpioDirection, value: GpioValue) -> Result<Self, RectError> {
        let paired = match direction {
            GpioDirection::Output => value.is_output_level(),
            GpioDirection::Input => !value.is_output_level(),
        };

        if !paired {
            return Err(RectError::invalid_parameter(format!(
                "GPIO value {value:?} does not pair with direction {direction:?}"
            )));
        }

        Ok(Self {
            kind: ActionKind::Gpio {
                pin,
                direction,
                value,
            },
        })
    }

    /// Run one UART transaction: send `tx_data`, then expect `rx_len` bytes
    /// back within `rx_timeout_ms`. The send length on the wire is the
    /// buffer's length.
    pub fn uart(
        baud: UartBaudRate,
        parity: UartParity,
        stop_bits: u8,
        data_bits: u8,
        rx_timeout_ms: u32,
        rx_len: u32,
        tx_data: Vec<u8>,
    ) -> Result<Self, RectError> {
        if !matches!(stop_bits, 1 | 2) {
            return Err(RectError::invalid_parameter(format!(
                "UART stop bits must be 1 or 2, got {stop_bits}"
            )));
        }

        if !(5..=8).contains(&data_bits) {
            return Err(RectError::invalid_parameter(format!(
                "UART data bits must be within 5..=8, got {data_bits}"
            )));
        }

        Ok(Self {
            kind: ActionKind::Uart {
                baud,
                parity,
                stop_bits,
                data_bits,
                rx_timeout_ms,
                rx_len,
                tx_data,
            },
        })
    }

    /// Run one SPI transaction on the given chip-select pin. The send length
    /// on the wire is the buffer's length.
    pub fn spi(
        speed: SpiSpeed,
        cs_pin: u32,
        mode: SpiMode,
        bit_order: BitOrder,
        rx_len: u32,
        tx_data: Vec<u8>,
    ) -> Self {
        Self {
            kind: ActionKind::Spi {
                speed,
                cs_pin,
                mode,
                bit_order,
                rx_len,
                tx_data,
            },
        }
    }

    /// Read `length` bytes from `register` of the I2C device at `address`.
    pub fn i2c_read(speed: I2cSpeed, address: u8, register: u8, length: u32) -> Self {
        Self {
            kind: ActionKind::I2cRead {
                speed,
                address,
                register,
                length,
            },
        }
    }

    /// Write `data` to `register` of the I2C device at `address`.
    ///
    /// `length` must equal `data.len()`; it is carried on the wire alongside
    /// the buffer.
    pub fn i2c_write(
        speed: I2cSpeed,
        address: u8,
        register: u8,
        length: u32,
        data: Vec<u8>,
    ) -> Result<Self, RectError> {
        if length as usize != data.len() {
            return Err(RectError::invalid_parameter(format!(
                "I2C write length {length} does not match buffer of {} bytes",
                data.len()
            )));
        }

        Ok(Self {
            kind: ActionKind::I2cWrite {
                speed,
                address,
                register,
                data,
            },
        })
    }

    /// Sample an ADC channel against the given voltage reference.
    pub fn adc(channel: u32, reference: AdcReference) -> Self {
        Self {
            kind: ActionKind::Adc { channel, reference },
        }
    }

    /// Enable a PWM timer.
    ///
    /// `period` and `duration` are expressed in `unit`; the three duty-cycle
    /// values are percentages and must each be at most 100.
    pub fn pwm_enable(
        timer: u32,
        unit: TimeUnit,
        period: u32,
        duty: [u32; 3],
        duration: u32,
    ) -> Result<Self, RectError> {
        for value in duty {
            if value > 100 {
                return Err(RectError::invalid_parameter(format!(
                    "PWM duty cycle must be at most 100 percent, got {value}"
                )));
            }
        }

        Ok(Self {
            kind: ActionKind::PwmEnable {
                timer,
                unit,
                period,
                duty,
                duration,
            },
        })
    }

    /// Disable a PWM timer.
    pub fn pwm_disable(timer: u32) -> Self {
        Self {
            kind: ActionKind::PwmDisable { timer },
        }
    }

    /// Read a file from the board's storage.
    pub fn file_read(name: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::FileRead { name: name.into() },
        }
    }

    /// Write `content` to a named file on the board's storage.
    pub fn file_write(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::FileWrite {
                name: name.into(),
                content: content.into(),
            },
        }
    }

    /// Read the board's real-time clock.
    pub fn rtc_read() -> Self {
        Self {
            kind: ActionKind::RtcRead,
        }
    }

    /// Set the board's real-time clock.
    pub fn rtc_write(time: DateTime) -> Self {
        Self {
            kind: ActionKind::RtcWrite { time },
        }
    }

    /// The wire discriminator tag of this action.
    pub fn tag(&self) -> &'static str {
        match &self.kind {
            ActionKind::Gpio { .. } => "gpio",
            ActionKind::Uart { .. } => "uart",
            ActionKind::Spi { .. } => "spi",
            ActionKind::I2cRead { .. } | ActionKind::I2cWrite { .. } => "i2c",
            ActionKind::Adc { .. } => "adc",
            ActionKind::PwmEnable { .. } | ActionKind::PwmDisable { .. } => "pwm",
            ActionKind::FileRead { .. } | ActionKind::FileWrite { .. } => "file",
            ActionKind::RtcRead | ActionKind::RtcWrite { .. } => "rtc",
        }
    }

    /// The ordered heterogeneous field list this action occupies in the
    /// `actions` array of an event payload. The first field is always the
    /// discriminator tag; field order is part of the board protocol.
    pub fn wire_fields(&self) -> Vec<Value> {
        let mut fields = vec![json!(self.tag())];

        match &self.kind {
            ActionKind::Gpio {
                pin,
                direction,
                value,
            } => {
                fields.push(json!(pin));
                fields.push(json!(direction.wire_name()));
                fields.push(json!(value.wire_name()));
            }
            ActionKind::Uart {
                baud,
                parity,
                stop_bits,
                data_bits,
                rx_timeout_ms,
                rx_len,
                tx_data,
            } => {
                fields.push(json!(baud.bits_per_second()));
                fields.push(json!(parity.wire_name()));
                fields.push(json!(stop_bits));
                fields.push(json!(data_bits));
                fields.push(json!(rx_timeout_ms));
                fields.push(json!(rx_len));
                fields.push(json!(tx_data.len()));
                fields.push(json!(tx_data));
            }
            ActionKind::Spi {
                speed,
                cs_pin,
                mode,
                bit_order,
                rx_len,
                tx_data,
            } => {
                fields.push(json!(speed.wire_name()));
                fields.push(json!(cs_pin));
                fields.push(json!(mode.wire_name()));
                fields.push(json!(bit_order.wire_name()));
                fields.push(json!(rx_len));
                fields.push(json!(tx_data.len()));
                fields.push(json!(tx_data));
            }
            ActionKind::I2cRead {
                speed,
                address,
                register,
                length,
            } => {
                fields.push(json!("read"));
                fields.push(json!(speed.wire_name()));
                fields.push(json!(address));
                fields.push(json!(register));
                fields.push(json!(length));
            }
            ActionKind::I2cWrite {
                speed,
                address,
                register,
                data,
            } => {
                fields.push(json!("write"));
                fields.push(json!(speed.wire_name()));
                fields.push(json!(address));
                fields.push(json!(register));
                fields.push(json!(data.len()));
                fields.push(json!(data));
            }
            ActionKind::Adc { channel, reference } => {
                fields.push(json!(channel));
                fields.push(json!(reference.wire_name()));
            }
            ActionKind::PwmEnable {
                timer,
                unit,
                period,
                duty,
                duration,
            } => {
                fields.push(json!("enable"));
                fields.push(json!(timer));
                fields.push(json!(unit.suffix()));
                fields.push(json!(period));
                fields.push(json!(duty[0]));
                fields.push(json!(duty[1]));
                fields.push(json!(duty[2]));
                fields.push(json!(duration));
            }
            ActionKind::PwmDisable { timer } => {
                fields.push(json!("disable"));
                fields.push(json!(timer));
            }
            ActionKind::FileRead { name } => {
                fields.push(json!("read"));
                fields.push(json!(name));
            }
            ActionKind::FileWrite { name, content } => {
                fields.push(json!("write"));
                fields.push(json!(name));
                fields.push(json!(content));
            }
            ActionKind::RtcRead => {
                fields.push(json!("read"));
            }
            ActionKind::RtcWrite { time } => {
                fields.push(json!("write"));
                fields.push(json!(time.year()));
                fields.push(json!(time.month()));
                fields.push(json!(time.day()));
                fields.push(json!(time.hour()));
                fields.push(json!(time.minute()));
                fields.push(json!(time.second()));
            }
        }

        fields
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{
        Action, AdcReference, BitOrder, GpioDirection, GpioValue, I2cSpeed, SpiMode, SpiSpeed,
        UartBaudRate, UartParity,
    };
    use crate::envelope::{DateTime, TimeUnit};
    use crate::error::RectError;

    #[test]
    fn gpio_output_accepts_levels_in_wire_order() {
        for value in [GpioValue::Low, GpioValue::High] {
            let action = Action::gpio(4, GpioDirection::Output, value)
                .expect("output level should pair with output direction");
            let fields = action.wire_fields();
            assert_eq!(fields[0], json!("gpio"));
            assert_eq!(fields[1], json!(4));
            assert_eq!(fields[2], json!("output"));
            assert_eq!(fields.len(), 4);
        }
    }

    #[test]
    fn gpio_input_accepts_pull_configurations() {
        for value in [GpioValue::PullDisabled, GpioValue::PullEnabled] {
            let action = Action::gpio(4, GpioDirection::Input, value)
                .expect("pull configuration should pair with input direction");
            assert_eq!(action.wire_fields()[2], json!("input"));
        }
    }

    #[test]
    fn gpio_rejects_mismatched_direction_and_value() {
        let mismatched = [
            (GpioDirection::Output, GpioValue::PullDisabled),
            (GpioDirection::Output, GpioValue::PullEnabled),
            (GpioDirection::Input, GpioValue::Low),
            (GpioDirection::Input, GpioValue::High),
        ];

        for (direction, value) in mismatched {
            let result = Action::gpio(0, direction, value);
            assert!(
                matches!(result, Err(RectError::InvalidParameter { .. })),
                "{direction:?}/{value:?} should be rejected"
            );
        }
    }

    #[test]
    fn gpio_encodes_pull_values_with_wire_names() {
        let action = Action::gpio(7, GpioDirection::Input, GpioValue::PullEnabled)
            .expect("valid GPIO input action");
        assert_eq!(
            action.wire_fields(),
            vec![json!("gpio"), json!(7), json!("input"), json!("enabled")]
        );
    }

    #[test]
    fn uart_rejects_invalid_framing_parameters() {
        let bad_stop = Action::uart(
            UartBaudRate::B115200,
            UartParity::None,
            3,
            8,
            100,
            0,
            Vec::new(),
        );
        assert!(matches!(bad_stop, Err(RectError::InvalidParameter { .. })));

        let bad_data_bits = Action::uart(
            UartBaudRate::B115200,
            UartParity::None,
            1,
            9,
            100,
            0,
            Vec::new(),
        );
        assert!(matches!(
            bad_data_bits,
            Err(RectError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn uart_encodes_baud_as_number_and_send_length_from_buffer() {
        let action = Action::uart(
            UartBaudRate::B9600,
            UartParity::Even,
            1,
            8,
            250,
            16,
            vec![0x01, 0x02, 0x03],
        )
        .expect("valid UART action");

        let fields = action.wire_fields();
        assert_eq!(fields[1], json!(9600));
        assert_eq!(fields[2], json!("even"));
        assert_eq!(fields[6], json!(16));
        assert_eq!(fields[7], json!(3));
        assert_eq!(fields[8], json!([1, 2, 3]));
    }

    #[test]
    fn spi_encodes_mode_bit_order_and_send_length_from_buffer() {
        let action = Action::spi(
            SpiSpeed::High,
            2,
            SpiMode::Mode3,
            BitOrder::LsbFirst,
            4,
            vec![0xDE, 0xAD],
        );

        let fields = action.wire_fields();
        assert_eq!(fields[0], json!("spi"));
        assert_eq!(fields[1], json!("high"));
        assert_eq!(fields[3], json!("mode3"));
        assert_eq!(fields[4], json!("lsb"));
        assert_eq!(fields[6], json!(2));
        assert_eq!(fields[7], json!([0xDE, 0xAD]));
    }

    #[test]
    fn i2c_write_has_exactly_one_more_field_than_read() {
        let read = Action::i2c_read(I2cSpeed::Fast, 0x48, 0x01, 2);
        let write = Action::i2c_write(I2cSpeed::Fast, 0x48, 0x01, 2, vec![0x10, 0x20])
            .expect("matching length and buffer");

        let read_fields = read.wire_fields();
        let write_fields = write.wire_fields();
        assert_eq!(read_fields[1], json!("read"));
        assert_eq!(write_fields[1], json!("write"));
        assert_eq!(write_fields.len(), read_fields.len() + 1);
        assert_eq!(write_fields[6], json!([0x10, 0x20]));
    }

    #[test]
    fn i2c_write_rejects_length_mismatch() {
        let result = Action::i2c_write(I2cSpeed::Standard, 0x48, 0x01, 3, vec![0x10]);
        assert!(matches!(result, Err(RectError::InvalidParameter { .. })));
    }

    #[test]
    fn adc_encodes_channel_and_reference() {
        let action = Action::adc(3, AdcReference::External);
        assert_eq!(
            action.wire_fields(),
            vec![json!("adc"), json!(3), json!("external")]
        );
    }

    #[test]
    fn pwm_enable_and_disable_are_distinct_encodings() {
        let enable = Action::pwm_enable(1, TimeUnit::Seconds, 10, [25, 50, 75], 60)
            .expect("valid PWM enable action");
        let disable = Action::pwm_disable(1);

        assert_eq!(
            enable.wire_fields(),
            vec![
                json!("pwm"),
                json!("enable"),
                json!(1),
                json!("s"),
                json!(10),
                json!(25),
                json!(50),
                json!(75),
                json!(60),
            ]
        );
        assert_eq!(
            disable.wire_fields(),
            vec![json!("pwm"), json!("disable"), json!(1)]
        );
    }

    #[test]
    fn pwm_enable_rejects_duty_above_100_percent() {
        let result = Action::pwm_enable(0, TimeUnit::Seconds, 10, [50, 101, 50], 60);
        assert!(matches!(result, Err(RectError::InvalidParameter { .. })));
    }

    #[test]
    fn file_write_carries_destination_name() {
        let read = Action::file_read("log.txt");
        let write = Action::file_write("log.txt", "hello");

        assert_eq!(
            read.wire_fields(),
            vec![json!("file"), json!("read"), json!("log.txt")]
        );
        assert_eq!(
            write.wire_fields(),
            vec![
                json!("file"),
                json!("write"),
                json!("log.txt"),
                json!("hello")
            ]
        );
    }

    #[test]
    fn rtc_write_expands_calendar_fields() {
        let time = DateTime::new(2025, 12, 31, 23, 59, 58).expect("valid calendar time");
        let action = Action::rtc_write(time);

        assert_eq!(
            action.wire_fields(),
            vec![
                json!("rtc"),
                json!("write"),
                json!(2025),
                json!(12),
                json!(31),
                json!(23),
                json!(59),
                json!(58),
            ]
        );
        assert_eq!(
            Action::rtc_read().wire_fields(),
            vec![json!("rtc"), json!("read")]
        );
    }
}
