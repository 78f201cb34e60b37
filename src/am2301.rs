use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};

use crate::error::{DhtError, HandshakePhase};

/// Quantum of the busy-poll loop, in microseconds.
///
/// Kept well below the shortest phase timeout (40us) so a short pulse cannot
/// be missed. Note that the per-poll overhead of the host's GPIO read adds a
/// platform-dependent bias on top of this quantum.
const POLL_INTERVAL_US: u16 = 2;

/// How long the host holds the line low to start a transaction, in
/// microseconds.
const HOST_RESET_HOLD_US: u32 = 20_000;

/// Timeout for the sensor pulling the line low after the host reset.
const ACK_START_TIMEOUT_US: u16 = 40;
/// Timeout for the sensor's ~80us acknowledgement high pulse.
const ACK_HIGH_TIMEOUT_US: u16 = 88;
/// Timeout for the line going low again before the first data bit.
const ACK_END_TIMEOUT_US: u16 = 88;

/// Timeout for the low phase of one data bit.
const BIT_LOW_TIMEOUT_US: u16 = 65;
/// Timeout for the high phase of one data bit.
const BIT_HIGH_TIMEOUT_US: u16 = 75;

const DATA_BITS: u8 = 40;
const FRAME_BYTES: usize = 5;

/// Minimum time between two transactions, in milliseconds.
///
/// The sensing element needs this long to settle internally, whether or not
/// the previous transaction succeeded. The driver does not enforce the
/// interval; the caller's polling loop must.
pub const MIN_SAMPLE_INTERVAL_MS: u32 = 2_000;

/// Driver for AM2301/DHT22-class temperature and humidity sensors.
///
/// The sensor's data line must be connected to an open-drain pin with a
/// pull-up, so that driving the pin high releases the line while it can still
/// be sampled as an input.
pub struct Am2301<PIN, D> {
    pin: PIN,
    delay: D,
}

/// Scaled reading returned by [`Am2301::read_scaled`].
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reading {
    /// Temperature in degrees Celsius.
    pub temperature: f32,
    /// Relative humidity in percent.
    pub relative_humidity: f32,
}

/// Fixed-point reading returned by [`Am2301::read_raw`].
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawReading {
    /// Relative humidity in tenths of a percent.
    pub humidity: u16,
    /// Temperature in tenths of a degree Celsius.
    pub temperature: i16,
}

/// Selects which fields of the sensor frame get decoded.
///
/// The transaction always transfers the full frame; this only controls which
/// fields of the result are populated. Requesting neither field is rejected
/// with [`DhtError::InvalidArgument`].
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Channels {
    pub humidity: bool,
    pub temperature: bool,
}

impl Channels {
    pub const BOTH: Channels = Channels {
        humidity: true,
        temperature: true,
    };
    pub const HUMIDITY: Channels = Channels {
        humidity: true,
        temperature: false,
    };
    pub const TEMPERATURE: Channels = Channels {
        humidity: false,
        temperature: true,
    };
}

/// Result of [`Am2301::read_channels`]; fields not requested are `None`.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelReading {
    /// Relative humidity in tenths of a percent, if requested.
    pub humidity: Option<u16>,
    /// Temperature in tenths of a degree Celsius, if requested.
    pub temperature: Option<i16>,
}

/// Pin level expected by the timing primitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Level {
    Low,
    High,
}

/// Failure of a single level wait; the caller maps it onto the phase or bit
/// it was waiting for.
#[derive(Debug)]
enum WaitError<E> {
    Timeout,
    Pin(E),
}

impl<E> WaitError<E> {
    fn into_handshake(self, phase: HandshakePhase) -> DhtError<E> {
        match self {
            WaitError::Timeout => DhtError::HandshakeTimeout(phase),
            WaitError::Pin(e) => DhtError::PinError(e),
        }
    }

    fn into_bit(self, bit: u8) -> DhtError<E> {
        match self {
            WaitError::Timeout => DhtError::BitTimeout { bit },
            WaitError::Pin(e) => DhtError::PinError(e),
        }
    }
}

fn decode_humidity(hi: u8, lo: u8) -> u16 {
    // No sign bit; the full 16 bits are the magnitude in tenths of a percent.
    u16::from_be_bytes([hi, lo])
}

fn decode_temperature(hi: u8, lo: u8) -> i16 {
    let magnitude = i16::from_be_bytes([hi & 0x7F, lo]);
    if hi & 0x80 != 0 {
        -magnitude
    } else {
        magnitude
    }
}

impl<PIN, DELAY, E> Am2301<PIN, DELAY>
where
    PIN: InputPin<Error = E> + OutputPin<Error = E>,
    DELAY: DelayNs,
{
    /// Creates a new instance of the AM2301 driver.
    ///
    /// # Arguments
    ///
    /// * `pin` - The open-drain GPIO pin connected to the sensor's data line.
    ///   Must support both input and output.
    /// * `delay` - A delay provider implementing the `DelayNs` trait.
    pub fn new(pin: PIN, delay: DELAY) -> Self {
        Am2301 { pin, delay }
    }

    /// Reads one measurement as tenths-scaled integers.
    ///
    /// Performs the complete transaction: host reset pulse, sensor
    /// acknowledgement, 40 timed data bits, checksum validation, and
    /// conversion of the two 16-bit fields. The handshake and bit transfer
    /// run inside a [`critical_section::with`] scope, since any preemption
    /// during that window corrupts the measured pulse widths.
    ///
    /// The data line is restored to its idle high state on every outcome, so
    /// a failed transaction cannot wedge the line for the next attempt. Leave
    /// at least [`MIN_SAMPLE_INTERVAL_MS`] between calls.
    pub fn read_raw(&mut self) -> Result<RawReading, DhtError<E>> {
        let frame = self.read_frame()?;
        Ok(RawReading {
            humidity: decode_humidity(frame[0], frame[1]),
            temperature: decode_temperature(frame[2], frame[3]),
        })
    }

    /// Reads one measurement as floating-point percent and degrees Celsius.
    ///
    /// Wraps [`Am2301::read_raw`], dividing both fields by 10.
    pub fn read_scaled(&mut self) -> Result<Reading, DhtError<E>> {
        let raw = self.read_raw()?;
        Ok(Reading {
            temperature: f32::from(raw.temperature) / 10.0,
            relative_humidity: f32::from(raw.humidity) / 10.0,
        })
    }

    /// Reads one measurement, decoding only the requested fields.
    ///
    /// Requesting neither field returns [`DhtError::InvalidArgument`] without
    /// touching the pin.
    pub fn read_channels(&mut self, channels: Channels) -> Result<ChannelReading, DhtError<E>> {
        if !channels.humidity && !channels.temperature {
            return Err(DhtError::InvalidArgument);
        }

        let frame = self.read_frame()?;
        Ok(ChannelReading {
            humidity: channels
                .humidity
                .then(|| decode_humidity(frame[0], frame[1])),
            temperature: channels
                .temperature
                .then(|| decode_temperature(frame[2], frame[3])),
        })
    }

    /// Runs one full transaction and returns the validated 5-byte frame.
    fn read_frame(&mut self) -> Result<[u8; FRAME_BYTES], DhtError<E>> {
        // Line idles high before the transaction starts.
        self.pin.set_high()?;

        let result = critical_section::with(|_cs| self.fetch_frame());

        // Restore the idle state unconditionally; the transfer leaves the
        // line released and it must not float between transactions.
        let restored = self.pin.set_high();
        let frame = result?;
        restored?;

        let computed = frame[..4].iter().fold(0u8, |sum, v| sum.wrapping_add(*v));
        if frame[4] != computed {
            return Err(DhtError::ChecksumMismatch {
                received: frame[4],
                computed,
            });
        }

        Ok(frame)
    }

    /// Drives the reset pulse, waits out the acknowledgement, and times the
    /// 40 data bits. Must run with preemption suspended.
    fn fetch_frame(&mut self) -> Result<[u8; FRAME_BYTES], DhtError<E>> {
        // Host reset: hold the line low, then release it to the pull-up.
        self.pin.set_low()?;
        self.delay.delay_us(HOST_RESET_HOLD_US);
        self.pin.set_high()?;

        // Sensor acknowledgement: low, high, low.
        self.await_level(Level::Low, ACK_START_TIMEOUT_US)
            .map_err(|e| e.into_handshake(HandshakePhase::AckStart))?;
        self.await_level(Level::High, ACK_HIGH_TIMEOUT_US)
            .map_err(|e| e.into_handshake(HandshakePhase::AckHigh))?;
        self.await_level(Level::Low, ACK_END_TIMEOUT_US)
            .map_err(|e| e.into_handshake(HandshakePhase::AckEnd))?;

        let mut frame = [0u8; FRAME_BYTES];
        for bit in 0..DATA_BITS {
            let low_duration = self
                .await_level(Level::High, BIT_LOW_TIMEOUT_US)
                .map_err(|e| e.into_bit(bit))?;
            let high_duration = self
                .await_level(Level::Low, BIT_HIGH_TIMEOUT_US)
                .map_err(|e| e.into_bit(bit))?;

            // The sensor encodes the bit value in the width of the high
            // pulse relative to the preceding low pulse.
            if high_duration > low_duration {
                frame[(bit / 8) as usize] |= 1 << (7 - bit % 8);
            }
        }

        Ok(frame)
    }

    /// Busy-polls the data line until it reaches `expected`, returning the
    /// elapsed microseconds, or times out after `timeout_us`.
    ///
    /// Always waits one poll interval before the first sample so a stale
    /// level from the previous phase is not read back as a jitter.
    fn await_level(&mut self, expected: Level, timeout_us: u16) -> Result<u16, WaitError<E>> {
        let mut elapsed: u16 = 0;
        while elapsed < timeout_us {
            self.delay.delay_us(u32::from(POLL_INTERVAL_US));
            let at_expected = match expected {
                Level::Low => self.pin.is_low(),
                Level::High => self.pin.is_high(),
            }
            .map_err(WaitError::Pin)?;
            if at_expected {
                return Ok(elapsed);
            }
            elapsed += POLL_INTERVAL_US;
        }
        Err(WaitError::Timeout)
    }
}
