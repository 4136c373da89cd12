use super::acma::AcmaLicense;
use super::callook::UsLicense;
use super::hamqth::HamQthRecord;
use super::ic::IcRecord;
use super::nkom::NkomRecord;
use hamfurs_common::ItuCountry;
use std::fmt;

/// Where a callbook record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Callook,
    HamQth,
    Ic,
    Nkom,
    Acma,
}

impl Source {
    pub fn label(&self) -> &'static str {
        match self {
            Source::Callook => "callook.info",
            Source::HamQth => "HamQTH",
            Source::Ic => "IC",
            Source::Nkom => "Nkom",
            Source::Acma => "ACMA",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A record from one of the callbooks. Each variant keeps its source's shape.
#[derive(Debug, Clone, PartialEq)]
pub enum CallbookRecord {
    Us(UsLicense),
    Ca(IcRecord),
    No(NkomRecord),
    Au(AcmaLicense),
    HamQth(HamQthRecord),
    Unknown(UnknownCallsign),
}

/// No callbook knows the callsign; only structural classification is left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCallsign {
    pub callsign: String,
    pub country: Option<ItuCountry>,
}

impl From<UsLicense> for CallbookRecord {
    fn from(value: UsLicense) -> Self {
        CallbookRecord::Us(value)
    }
}

impl From<IcRecord> for CallbookRecord {
    fn from(value: IcRecord) -> Self {
        CallbookRecord::Ca(value)
    }
}

impl From<NkomRecord> for CallbookRecord {
    fn from(value: NkomRecord) -> Self {
        CallbookRecord::No(value)
    }
}

impl From<AcmaLicense> for CallbookRecord {
    fn from(value: AcmaLicense) -> Self {
        CallbookRecord::Au(value)
    }
}

impl From<HamQthRecord> for CallbookRecord {
    fn from(value: HamQthRecord) -> Self {
        CallbookRecord::HamQth(value)
    }
}
