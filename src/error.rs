/// Handshake phase in which the sensor failed to respond in time.
///
/// After the host releases the line, the sensor must answer with a
/// low-high-low acknowledgement sequence before the first data bit.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandshakePhase {
    /// Waiting for the sensor to pull the line low after the host reset.
    AckStart,
    /// Waiting for the sensor's acknowledgement high pulse.
    AckHigh,
    /// Waiting for the line to go low again before the first data bit.
    AckEnd,
}

/// Possible errors from the AM2301 driver.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq)]
pub enum DhtError<E> {
    /// Neither humidity nor temperature was requested from the read.
    ///
    /// This is a programmer error; retrying does not help.
    InvalidArgument,
    /// The sensor did not produce the expected acknowledgement pulse in time.
    HandshakeTimeout(HandshakePhase),
    /// Timed out waiting for a level change while reading the given data bit.
    BitTimeout {
        /// Index of the bit (0..40) whose low or high phase timed out.
        bit: u8,
    },
    /// Checksum did not match the received data.
    ChecksumMismatch {
        /// Checksum byte transmitted by the sensor.
        received: u8,
        /// Checksum computed over the four data bytes.
        computed: u8,
    },
    /// Error from the GPIO pin (input/output).
    PinError(E),
}

impl<E> From<E> for DhtError<E> {
    fn from(value: E) -> Self {
        Self::PinError(value)
    }
}
