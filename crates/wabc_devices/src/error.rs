use std::fmt::{Debug, Formatter};

use wabc_core::error::WabcError;

pub enum DeviceError<E> {
    ///The bus transport reported a failure. The transport's own error is passed through untouched.
    Bus(E),
    ///A PWM channel outside 0..=15 was requested while the driver runs with the strict channel policy.
    InvalidChannel(u8),
}

impl<E: Debug> Debug for DeviceError<E> {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            Self::Bus(err) => fmt.write_fmt(format_args!("bus error: {:?}", err)),
            Self::InvalidChannel(channel) => fmt.write_fmt(format_args!(
                "invalid pwm channel {}, expected 0..=15",
                channel
            )),
        }
    }
}

impl<E> From<E> for DeviceError<E> {
    fn from(err: E) -> Self {
        DeviceError::Bus(err)
    }
}

impl<E: Debug> From<DeviceError<E>> for WabcError {
    fn from(err: DeviceError<E>) -> Self {
        WabcError::from_string(format!("{:?}", err))
    }
}
