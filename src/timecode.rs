//! Timecode arithmetic at broadcast frame rates.
//!
//! The canonical internal unit is integer microseconds, SMPTE strings are derived on demand.
//! 29.97 and 59.94 are drop-frame rates per SMPTE ST 12-1 : the first frames of every minute are
//! skipped in the labeling, except every tenth minute, so wall clock and label stay within a frame
//! of each other.

/// A frame rate as detected from a disk format code or supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rate {
    fps: f64,
}

impl Rate {
    pub const F25: Rate = Rate { fps: 25.0 };
    pub const F30: Rate = Rate { fps: 30.0 };

    /// Accepts any positive rate, e.g. from an override given by the caller.
    pub fn new(fps: f64) -> Option<Rate> {
        if fps.is_finite() && fps > 0.0 {
            Some(Rate { fps })
        } else {
            None
        }
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Whole frames per labeled second (30 for 29.97).
    fn nominal(&self) -> u64 {
        self.fps.round() as u64
    }

    pub fn is_drop_frame(&self) -> bool {
        let hundredths = (self.fps * 100.0).round() as u64;
        hundredths == 2997 || hundredths == 5994
    }

    /// Labels dropped at the start of each minute (2 at 29.97, 4 at 59.94).
    fn dropped_per_minute(&self) -> u64 {
        self.nominal() / 15
    }
}

//
// -----

/// An HH:MM:SS:FF label, as stored in the TCI/TCO fields of a TTI block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timecode {
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
    pub frames: u8,
}

impl Timecode {
    pub fn from_bytes(bytes: [u8; 4]) -> Timecode {
        Timecode {
            hours: bytes[0],
            minutes: bytes[1],
            seconds: bytes[2],
            frames: bytes[3],
        }
    }

    pub fn to_bytes(&self) -> [u8; 4] {
        [self.hours, self.minutes, self.seconds, self.frames]
    }

    /// Microseconds from 00:00:00:00 to this label.
    pub fn to_us(&self, rate: Rate) -> u64 {
        if rate.is_drop_frame() {
            let nominal = rate.nominal();
            let dropped = rate.dropped_per_minute();

            // Labels inside the dropped window do not exist, skip forward to the first valid one
            let mut frames = self.frames as u64;
            if self.seconds == 0 && self.minutes % 10 != 0 && frames < dropped {
                frames = dropped;
            }

            let total_minutes = self.hours as u64 * 60 + self.minutes as u64;
            let label_frames = nominal
                * (self.hours as u64 * 3600 + self.minutes as u64 * 60 + self.seconds as u64)
                + frames;
            let frame = label_frames - dropped * (total_minutes - total_minutes / 10);

            // 1001/1000 pulldown : each frame lasts 1001000/nominal microseconds
            frame * 1_001_000 / nominal
        } else {
            let seconds =
                self.hours as u64 * 3600 + self.minutes as u64 * 60 + self.seconds as u64;
            let frame_us = (self.frames as f64 * 1_000_000.0 / rate.fps).round() as u64;
            seconds * 1_000_000 + frame_us
        }
    }

    /// The label of the frame at `us` microseconds.
    pub fn from_us(us: u64, rate: Rate) -> Timecode {
        let nominal = rate.nominal();

        if rate.is_drop_frame() {
            let dropped = rate.dropped_per_minute();
            let per_minute = 60 * nominal - dropped;
            let per_ten_minutes = 600 * nominal - 9 * dropped;

            let frame = (us * nominal + 500_500) / 1_001_000;

            // Re-insert the dropped labels to go from frame count to label
            let tens = frame / per_ten_minutes;
            let rest = frame % per_ten_minutes;
            let mut label = frame + 9 * dropped * tens;
            if rest >= dropped {
                label += dropped * ((rest - dropped) / per_minute);
            }

            Timecode {
                hours: ((label / (3600 * nominal)) % 24) as u8,
                minutes: ((label / (60 * nominal)) % 60) as u8,
                seconds: ((label / nominal) % 60) as u8,
                frames: (label % nominal) as u8,
            }
        } else {
            let frame = (us as f64 * rate.fps / 1_000_000.0).round() as u64;
            Timecode {
                hours: ((frame / (3600 * nominal)) % 24) as u8,
                minutes: ((frame / (60 * nominal)) % 60) as u8,
                seconds: ((frame / nominal) % 60) as u8,
                frames: (frame % nominal) as u8,
            }
        }
    }

    /// SMPTE string, `;` before the frame count for drop-frame rates.
    pub fn format(&self, rate: Rate) -> String {
        let separator = if rate.is_drop_frame() { ';' } else { ':' };
        format!(
            "{:02}:{:02}:{:02}{}{:02}",
            self.hours, self.minutes, self.seconds, separator, self.frames
        )
    }
}

/// Convenience going straight from microseconds to an SMPTE string.
pub fn us_to_smpte(us: u64, rate: Rate) -> String {
    Timecode::from_us(us, rate).format(rate)
}

//
// -----

#[cfg(test)]
mod tests {
    use super::*;

    const F29_97: Rate = Rate { fps: 29.97 };

    #[test]
    fn integer_rates() {
        let tc = Timecode {
            hours: 0,
            minutes: 0,
            seconds: 1,
            frames: 0,
        };
        assert_eq!(tc.to_us(Rate::F25), 1_000_000);
        assert_eq!(tc.to_us(Rate::F30), 1_000_000);

        let tc = Timecode {
            hours: 1,
            minutes: 2,
            seconds: 3,
            frames: 12,
        };
        assert_eq!(tc.to_us(Rate::F25), 3_723_000_000 + 480_000);
        assert_eq!(tc.format(Rate::F25), "01:02:03:12");
    }

    #[test]
    fn drop_frame_minute_boundary() {
        // 00:01:00:00 does not exist at 29.97, it lands on the first valid label of the minute
        let tc = Timecode {
            hours: 0,
            minutes: 1,
            seconds: 0,
            frames: 0,
        };
        assert_eq!(tc.to_us(F29_97), 60_060_000);
        assert_eq!(us_to_smpte(60_060_000, F29_97), "00:01:00;02");

        // The frame just before the boundary
        let tc = Timecode {
            hours: 0,
            minutes: 0,
            seconds: 59,
            frames: 29,
        };
        assert_eq!(us_to_smpte(tc.to_us(F29_97), F29_97), "00:00:59;29");

        // Every tenth minute keeps its first two frames
        let tc = Timecode {
            hours: 0,
            minutes: 10,
            seconds: 0,
            frames: 0,
        };
        assert_eq!(us_to_smpte(tc.to_us(F29_97), F29_97), "00:10:00;00");
    }

    #[test]
    fn round_trip_25() {
        sweep(Rate::F25);
    }

    #[test]
    fn round_trip_30() {
        sweep(Rate::F30);
    }

    #[test]
    fn round_trip_drop_frame() {
        sweep(F29_97);
    }

    // Every label of two full hours must survive label -> us -> label
    fn sweep(rate: Rate) {
        let dropped = if rate.is_drop_frame() {
            rate.dropped_per_minute() as u8
        } else {
            0
        };

        for hours in [0, 23] {
            for minutes in 0..60 {
                for seconds in 0..60 {
                    for frames in 0..rate.nominal() as u8 {
                        // Skip labels that do not exist at this rate
                        if seconds == 0 && minutes % 10 != 0 && frames < dropped {
                            continue;
                        }

                        let tc = Timecode {
                            hours,
                            minutes,
                            seconds,
                            frames,
                        };
                        let us = tc.to_us(rate);
                        assert_eq!(Timecode::from_us(us, rate), tc, "at {us} us");
                    }
                }
            }
        }
    }
}
