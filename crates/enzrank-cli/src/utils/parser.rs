use enzrank::core::models::residue::AminoAcid;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid residue alphabet '{alphabet}': '{symbol}' is not a canonical one-letter code.")]
    InvalidAlphabetSymbol { alphabet: String, symbol: char },

    #[error("Residue alphabet cannot be empty.")]
    EmptyAlphabet,

    #[error("Invalid --set format: '{0}'. Expected KEY=VALUE.")]
    InvalidKeyValue(String),

    #[error("Invalid {kind} value for '{key}': '{value}'")]
    InvalidValue {
        key: String,
        kind: &'static str,
        value: String,
    },
}

/// Parses a one-letter residue alphabet such as `"ADEFGHIKLMNQRSTVWY"`.
/// Whitespace is ignored; repeated letters are kept once, in first-seen order.
pub fn parse_alphabet(alphabet: &str) -> Result<Vec<AminoAcid>, ParseError> {
    let mut residues = Vec::new();
    for symbol in alphabet.chars().filter(|c| !c.is_whitespace()) {
        let residue = AminoAcid::from_one_letter(symbol.to_ascii_uppercase()).ok_or_else(|| {
            ParseError::InvalidAlphabetSymbol {
                alphabet: alphabet.to_string(),
                symbol,
            }
        })?;
        if !residues.contains(&residue) {
            residues.push(residue);
        }
    }
    if residues.is_empty() {
        return Err(ParseError::EmptyAlphabet);
    }
    Ok(residues)
}

pub fn split_key_value(pair: &str) -> Result<(&str, &str), ParseError> {
    match pair.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value.trim())),
        _ => Err(ParseError::InvalidKeyValue(pair.to_string())),
    }
}

pub fn parse_value<T: std::str::FromStr>(
    key: &str,
    kind: &'static str,
    value: &str,
) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidValue {
        key: key.to_string(),
        kind,
        value: value.to_string(),
    })
}
