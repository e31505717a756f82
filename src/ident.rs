//! Personnel identifier codec
//! --------------------------
//! Validation, decoding and display formatting for the two fixed-width identifiers
//! carried by every employee record:
//! - NIP: 18-digit civil-service number `[birth yyyymmdd][TMT CPNS yyyymm][gender][seq]`
//! - NIK: 16-digit national identity number (format only, no decoding)
//!
//! Validity is purely a format question (length + ASCII digits); nothing here checks
//! that the encoded dates exist. Use [`NipInfo::birth_date`] when a calendar value is needed.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{codes, AppError};

pub const NIP_LEN: usize = 18;
pub const NIK_LEN: usize = 16;

static NIP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{8})(\d{6})(\d{1})(\d{3})$").unwrap());
// Extended NIP with the 6-digit work code suffix
static NIK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{4})(\d{4})(\d{4})(\d{4})$").unwrap());

/// Outcome of a format check, shaped for inline display next to a form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Validation {
    pub fn ok() -> Self { Self { valid: true, message: None } }
    pub fn fail(msg: impl Into<String>) -> Self { Self { valid: false, message: Some(msg.into()) } }
}

fn all_digits(s: &str) -> bool { s.chars().all(|c| c.is_ascii_digit()) }

fn validate_fixed(value: &str, len: usize, label: &str) -> Validation {
    if value.is_empty() {
        return Validation::fail(format!("{} wajib diisi", label));
    }
    if value.chars().count() != len {
        return Validation::fail(format!("{} harus {} digit", label, len));
    }
    if !all_digits(value) {
        return Validation::fail(format!("{} harus berupa angka", label));
    }
    Validation::ok()
}

/// Check that `nip` is exactly 18 ASCII digits. Empty, wrong length and non-digit inputs
/// each get their own message, checked in that order.
pub fn validate_nip(nip: &str) -> Validation { validate_fixed(nip, NIP_LEN, "NIP") }

/// Same contract as [`validate_nip`] for the 16-digit NIK.
pub fn validate_nik(nik: &str) -> Validation { validate_fixed(nik, NIK_LEN, "NIK") }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    /// Laki-laki
    L,
    /// Perempuan
    P,
}

impl Gender {
    pub fn label(self) -> &'static str {
        match self {
            Gender::L => "Laki-laki",
            Gender::P => "Perempuan",
        }
    }
}

/// How the gender digit of a NIP maps onto [`Gender`]. Kept as data so the mapping can be
/// swapped without touching the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenderParity {
    pub even: Gender,
    pub odd: Gender,
}

impl Default for GenderParity {
    fn default() -> Self { Self { even: Gender::P, odd: Gender::L } }
}

impl GenderParity {
    pub fn resolve(&self, digit: u32) -> Gender {
        if digit % 2 == 0 { self.even } else { self.odd }
    }
}

/// Fields sliced out of a well-formed NIP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NipInfo {
    /// Raw birth date digits, `yyyymmdd`.
    pub tanggal_lahir: String,
    pub tahun_lahir: u32,
    pub bulan_lahir: u32,
    pub tanggal_lahir_num: u32,
    /// Raw appointment digits, `yyyymm`.
    #[serde(rename = "tmtCPNS")]
    pub tmt_cpns: String,
    pub gender: Gender,
    pub nomor_urut: String,
}

impl NipInfo {
    /// Birth date as a calendar date, `None` when the digits do not name a real day.
    pub fn birth_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.tahun_lahir as i32, self.bulan_lahir, self.tanggal_lahir_num)
    }

    /// First day of the TMT CPNS month, `None` when the month is out of range.
    pub fn tmt_cpns_month(&self) -> Option<NaiveDate> {
        let year: i32 = self.tmt_cpns[0..4].parse().ok()?;
        let month: u32 = self.tmt_cpns[4..6].parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, 1)
    }
}

/// Decode a NIP with the default gender parity (even => P, odd => L).
pub fn parse_nip(nip: &str) -> Option<NipInfo> { parse_nip_with(nip, &GenderParity::default()) }

pub fn parse_nip_with(nip: &str, parity: &GenderParity) -> Option<NipInfo> {
    if !validate_nip(nip).valid { return None; }
    // all ASCII from here on, byte offsets are character offsets
    let num = |a: usize, b: usize| nip[a..b].parse::<u32>().ok();
    Some(NipInfo {
        tanggal_lahir: nip[0..8].to_string(),
        tahun_lahir: num(0, 4)?,
        bulan_lahir: num(4, 6)?,
        tanggal_lahir_num: num(6, 8)?,
        tmt_cpns: nip[8..14].to_string(),
        gender: parity.resolve(num(14, 15)?),
        nomor_urut: nip[15..18].to_string(),
    })
}

/// Group a NIP for display: `19850101 201001 1 001`. Anything that is not exactly 18 digits
/// comes back unchanged.
pub fn format_nip(nip: &str) -> String {
    if NIP_RE.is_match(nip) {
        return NIP_RE.replace(nip, "$1 $2 $3 $4").into_owned();
    }
    nip.to_string()
}

/// Group a NIK in fours: `3171 1234 5678 0001`. Non-matching input comes back unchanged.
pub fn format_nik(nik: &str) -> String {
    if NIK_RE.is_match(nik) {
        return NIK_RE.replace(nik, "$1 $2 $3 $4").into_owned();
    }
    nik.to_string()
}

/// Strip the display spacing added by [`format_nip`] / [`format_nik`].
pub fn compact(formatted: &str) -> String {
    formatted.chars().filter(|c| !c.is_whitespace()).collect()
}

/// A NIP that passed [`validate_nip`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Nip(String);

impl Nip {
    pub fn as_str(&self) -> &str { &self.0 }
    pub fn info(&self) -> NipInfo {
        // validated on construction
        parse_nip(&self.0).unwrap_or_else(|| unreachable!("Nip holds a validated value"))
    }
}

impl FromStr for Nip {
    type Err = AppError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = compact(s);
        let v = validate_nip(&raw);
        if !v.valid {
            tracing::debug!(target: "sikerma::ident", "rejected NIP input len={}", raw.chars().count());
            return Err(AppError::user(codes::VAL_NIP_FORMAT.to_string(), v.message.unwrap_or_default()));
        }
        Ok(Nip(raw))
    }
}

impl TryFrom<String> for Nip {
    type Error = AppError;
    fn try_from(s: String) -> Result<Self, Self::Error> { s.parse() }
}

impl From<Nip> for String {
    fn from(n: Nip) -> Self { n.0 }
}

impl Display for Nip {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(&format_nip(&self.0)) }
}

/// A NIK that passed [`validate_nik`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Nik(String);

impl Nik {
    pub fn as_str(&self) -> &str { &self.0 }
}

impl FromStr for Nik {
    type Err = AppError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = compact(s);
        let v = validate_nik(&raw);
        if !v.valid {
            return Err(AppError::user(codes::VAL_NIK_FORMAT.to_string(), v.message.unwrap_or_default()));
        }
        Ok(Nik(raw))
    }
}

impl TryFrom<String> for Nik {
    type Error = AppError;
    fn try_from(s: String) -> Result<Self, Self::Error> { s.parse() }
}

impl From<Nik> for String {
    fn from(n: Nik) -> Self { n.0 }
}

impl Display for Nik {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(&format_nik(&self.0)) }
}
