//! Brazilian taxpayer identifiers.
//!
//! - [`Cpf`] - individual taxpayer registry, 11 digits
//! - [`Cnpj`] - business taxpayer registry, 14 digits
//!
//! Both schemes end in two check digits computed with a weighted mod-11 sum.
//! Formatting characters (`.`, `-`, `/`) are accepted and stripped before
//! validation; the stored value keeps only the digits.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Which tax-id scheme a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxIdKind {
    /// Individual taxpayer (clients).
    Cpf,
    /// Business taxpayer (shops).
    Cnpj,
}

impl TaxIdKind {
    /// Returns the field name used for this kind of id.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cpf => "cpf",
            Self::Cnpj => "cnpj",
        }
    }

    const fn digits(self) -> usize {
        match self {
            Self::Cpf => 11,
            Self::Cnpj => 14,
        }
    }
}

impl fmt::Display for TaxIdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

/// Errors that can occur when parsing a tax id.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TaxIdError {
    /// The value contains characters other than digits and separators.
    #[error("{kind} must contain only digits")]
    NotNumeric {
        /// Scheme being parsed.
        kind: TaxIdKind,
    },
    /// The value has the wrong number of digits.
    #[error("{kind} must have {expected} digits")]
    WrongLength {
        /// Scheme being parsed.
        kind: TaxIdKind,
        /// Required digit count.
        expected: usize,
    },
    /// Every digit is the same (passes the checksum but is never issued).
    #[error("{kind} cannot be a repeated digit sequence")]
    RepeatedDigits {
        /// Scheme being parsed.
        kind: TaxIdKind,
    },
    /// The check digits do not match.
    #[error("{kind} check digits do not match")]
    Checksum {
        /// Scheme being parsed.
        kind: TaxIdKind,
    },
}

impl TaxIdError {
    /// Returns the scheme the error refers to.
    #[must_use]
    pub const fn kind(&self) -> TaxIdKind {
        match self {
            Self::NotNumeric { kind }
            | Self::WrongLength { kind, .. }
            | Self::RepeatedDigits { kind }
            | Self::Checksum { kind } => *kind,
        }
    }
}

/// A validated CPF (individual taxpayer id).
///
/// ```
/// use petlife_core::Cpf;
///
/// assert!(Cpf::parse("529.982.247-25").is_ok());
/// assert!(Cpf::parse("52998224724").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cpf(String);

/// A validated CNPJ (business taxpayer id).
///
/// ```
/// use petlife_core::Cnpj;
///
/// assert!(Cnpj::parse("11.222.333/0001-81").is_ok());
/// assert!(Cnpj::parse("00000000000000").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cnpj(String);

const CPF_WEIGHTS: [u32; 10] = [11, 10, 9, 8, 7, 6, 5, 4, 3, 2];
const CNPJ_WEIGHTS: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

impl Cpf {
    /// Parse and checksum-validate a CPF.
    ///
    /// # Errors
    ///
    /// Returns a [`TaxIdError`] describing the first rule the input breaks.
    pub fn parse(s: &str) -> Result<Self, TaxIdError> {
        let digits = normalize(s, TaxIdKind::Cpf)?;
        let (body, check) = digits.split_at(9);

        let first = cpf_check_digit(body);
        let mut extended = body.to_vec();
        extended.push(first);
        let second = cpf_check_digit(&extended);

        if check != [first, second] {
            return Err(TaxIdError::Checksum {
                kind: TaxIdKind::Cpf,
            });
        }

        Ok(Self(to_string(&digits)))
    }

    /// Returns the digits as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Cnpj {
    /// Parse and checksum-validate a CNPJ.
    ///
    /// # Errors
    ///
    /// Returns a [`TaxIdError`] describing the first rule the input breaks.
    pub fn parse(s: &str) -> Result<Self, TaxIdError> {
        let digits = normalize(s, TaxIdKind::Cnpj)?;
        let (body, check) = digits.split_at(12);

        let first = cnpj_check_digit(body);
        let mut extended = body.to_vec();
        extended.push(first);
        let second = cnpj_check_digit(&extended);

        if check != [first, second] {
            return Err(TaxIdError::Checksum {
                kind: TaxIdKind::Cnpj,
            });
        }

        Ok(Self(to_string(&digits)))
    }

    /// Returns the digits as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cpf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for Cnpj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strip separators and check the digit count and repetition rules.
fn normalize(s: &str, kind: TaxIdKind) -> Result<Vec<u32>, TaxIdError> {
    let mut digits = Vec::with_capacity(kind.digits());
    for c in s.trim().chars() {
        match c {
            '.' | '-' | '/' => {}
            _ => digits.push(c.to_digit(10).ok_or(TaxIdError::NotNumeric { kind })?),
        }
    }

    if digits.len() != kind.digits() {
        return Err(TaxIdError::WrongLength {
            kind,
            expected: kind.digits(),
        });
    }

    if digits.windows(2).all(|pair| pair.first() == pair.last()) {
        return Err(TaxIdError::RepeatedDigits { kind });
    }

    Ok(digits)
}

/// CPF check digit: weights count down to 2 from `len + 1`; a remainder of 10
/// maps to 0.
fn cpf_check_digit(digits: &[u32]) -> u32 {
    let skip = CPF_WEIGHTS.len() - digits.len();
    let sum: u32 = digits
        .iter()
        .zip(CPF_WEIGHTS.iter().skip(skip))
        .map(|(d, w)| d * w)
        .sum();
    let rest = (sum * 10) % 11;
    if rest == 10 { 0 } else { rest }
}

/// CNPJ check digit: fixed weight table aligned to the right; remainders
/// below 2 map to 0.
fn cnpj_check_digit(digits: &[u32]) -> u32 {
    let skip = CNPJ_WEIGHTS.len() - digits.len();
    let sum: u32 = digits
        .iter()
        .zip(CNPJ_WEIGHTS.iter().skip(skip))
        .map(|(d, w)| d * w)
        .sum();
    let rest = sum % 11;
    if rest < 2 { 0 } else { 11 - rest }
}

fn to_string(digits: &[u32]) -> String {
    digits
        .iter()
        .filter_map(|d| char::from_digit(*d, 10))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_cpf() {
        assert_eq!(Cpf::parse("52998224725").unwrap().as_str(), "52998224725");
        assert_eq!(Cpf::parse("123.456.789-09").unwrap().as_str(), "12345678909");
    }

    #[test]
    fn test_cpf_bad_checksum() {
        assert_eq!(
            Cpf::parse("12345678900"),
            Err(TaxIdError::Checksum {
                kind: TaxIdKind::Cpf
            })
        );
    }

    #[test]
    fn test_cpf_repeated_digits() {
        assert!(matches!(
            Cpf::parse("11111111111"),
            Err(TaxIdError::RepeatedDigits { .. })
        ));
    }

    #[test]
    fn test_cpf_wrong_length() {
        assert!(matches!(
            Cpf::parse("5299822472"),
            Err(TaxIdError::WrongLength { expected: 11, .. })
        ));
    }

    #[test]
    fn test_cpf_not_numeric() {
        assert!(matches!(
            Cpf::parse("5299822472a"),
            Err(TaxIdError::NotNumeric { .. })
        ));
    }

    #[test]
    fn test_valid_cnpj() {
        assert_eq!(
            Cnpj::parse("11.222.333/0001-81").unwrap().as_str(),
            "11222333000181"
        );
    }

    #[test]
    fn test_cnpj_all_zeros() {
        let err = Cnpj::parse("00000000000000").unwrap_err();
        assert_eq!(err.kind(), TaxIdKind::Cnpj);
    }

    #[test]
    fn test_cnpj_bad_checksum() {
        assert!(matches!(
            Cnpj::parse("11222333000182"),
            Err(TaxIdError::Checksum { .. })
        ));
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(TaxIdKind::Cpf.to_string(), "CPF");
        assert_eq!(TaxIdKind::Cnpj.as_str(), "cnpj");
    }
}
