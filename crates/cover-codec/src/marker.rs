//! JPEG marker definitions (ITU T.81 Table B.1).

/// JPEG marker types.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
pub enum Marker {
    /// Start of Frame (baseline, progressive, etc). Parameter is the SOF type (0-15).
    SOF(u8),
    JPG,
    DHT,
    DAC,
    /// Restart marker (0-7).
    RST(u8),
    SOI,
    EOI,
    SOS,
    DQT,
    DNL,
    DRI,
    DHP,
    EXP,
    /// Application segment (0-15).
    APP(u8),
    JPGn(u8),
    COM,
    TEM,
    RES,
}

impl Marker {
    /// Whether this marker is followed by a 2-byte length field.
    pub fn has_length(self) -> bool {
        !matches!(self, Marker::RST(..) | Marker::SOI | Marker::EOI | Marker::TEM)
    }

    /// Convert a byte following a 0xFF fill prefix to a marker.
    /// Returns `None` for the stuffed byte `0x00` and the fill byte `0xFF`.
    pub fn from_u8(n: u8) -> Option<Marker> {
        use Marker::*;
        match n {
            0x00 => None,
            0x01 => Some(TEM),
            0x02..=0xBF => Some(RES),
            0xC0 => Some(SOF(0)),
            0xC1 => Some(SOF(1)),
            0xC2 => Some(SOF(2)),
            0xC3 => Some(SOF(3)),
            0xC4 => Some(DHT),
            0xC5 => Some(SOF(5)),
            0xC6 => Some(SOF(6)),
            0xC7 => Some(SOF(7)),
            0xC8 => Some(JPG),
            0xC9 => Some(SOF(9)),
            0xCA => Some(SOF(10)),
            0xCB => Some(SOF(11)),
            0xCC => Some(DAC),
            0xCD => Some(SOF(13)),
            0xCE => Some(SOF(14)),
            0xCF => Some(SOF(15)),
            0xD0..=0xD7 => Some(RST(n - 0xD0)),
            0xD8 => Some(SOI),
            0xD9 => Some(EOI),
            0xDA => Some(SOS),
            0xDB => Some(DQT),
            0xDC => Some(DNL),
            0xDD => Some(DRI),
            0xDE => Some(DHP),
            0xDF => Some(EXP),
            0xE0..=0xEF => Some(APP(n - 0xE0)),
            0xF0..=0xFD => Some(JPGn(n - 0xF0)),
            0xFE => Some(COM),
            0xFF => None,
        }
    }

    /// Convert a marker back to its byte representation.
    pub fn to_u8(self) -> u8 {
        use Marker::*;
        match self {
            TEM => 0x01,
            RES => 0x02,
            SOF(n) => match n {
                0 => 0xC0,
                1 => 0xC1,
                2 => 0xC2,
                3 => 0xC3,
                5 => 0xC5,
                6 => 0xC6,
                7 => 0xC7,
                9 => 0xC9,
                10 => 0xCA,
                11 => 0xCB,
                13 => 0xCD,
                14 => 0xCE,
                15 => 0xCF,
                _ => 0xC0,
            },
            JPG => 0xC8,
            DHT => 0xC4,
            DAC => 0xCC,
            RST(n) => 0xD0 + n,
            SOI => 0xD8,
            EOI => 0xD9,
            SOS => 0xDA,
            DQT => 0xDB,
            DNL => 0xDC,
            DRI => 0xDD,
            DHP => 0xDE,
            EXP => 0xDF,
            APP(n) => 0xE0 + n,
            JPGn(n) => 0xF0 + n,
            COM => 0xFE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_u8_roundtrips_common_markers() {
        assert_eq!(Marker::from_u8(0xD8), Some(Marker::SOI));
        assert_eq!(Marker::from_u8(0xD9), Some(Marker::EOI));
        assert_eq!(Marker::from_u8(0xC0), Some(Marker::SOF(0)));
        assert_eq!(Marker::from_u8(0xC2), Some(Marker::SOF(2)));
        assert_eq!(Marker::from_u8(0xDA), Some(Marker::SOS));
        assert_eq!(Marker::from_u8(0xDB), Some(Marker::DQT));
        assert_eq!(Marker::from_u8(0xC4), Some(Marker::DHT));
        assert_eq!(Marker::from_u8(0xE0), Some(Marker::APP(0)));
        assert_eq!(Marker::from_u8(0x00), None);
        assert_eq!(Marker::from_u8(0xFF), None);
    }

    #[test]
    fn to_u8_roundtrips_common_markers() {
        assert_eq!(Marker::SOI.to_u8(), 0xD8);
        assert_eq!(Marker::EOI.to_u8(), 0xD9);
        assert_eq!(Marker::SOF(2).to_u8(), 0xC2);
        assert_eq!(Marker::APP(0).to_u8(), 0xE0);
    }

    #[test]
    fn has_length_excludes_fixed_size_markers() {
        assert!(Marker::SOF(0).has_length());
        assert!(Marker::DQT.has_length());
        assert!(!Marker::SOI.has_length());
        assert!(!Marker::EOI.has_length());
        assert!(!Marker::RST(0).has_length());
    }
}
