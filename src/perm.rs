//! Permission triples in the provider's per-bit representation.
//!
//! OpenNebula stores permissions as nine individual use/manage/admin bits
//! across the owner, group and other classes. Users declare them as a
//! 3-character octal-style string ("640"), one digit per class. This module
//! converts between the two, exactly: `Permissions::from_octal_str(s)`
//! followed by `to_octal_string()` returns `s` for every valid input.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// The nine permission bits of a VM, as decoded from the provider's
/// `<PERMISSIONS>` block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    /// Owner use bit
    #[serde(rename = "OWNER_U")]
    pub owner_u: u8,
    /// Owner manage bit
    #[serde(rename = "OWNER_M")]
    pub owner_m: u8,
    /// Owner admin bit
    #[serde(rename = "OWNER_A")]
    pub owner_a: u8,
    /// Group use bit
    #[serde(rename = "GROUP_U")]
    pub group_u: u8,
    /// Group manage bit
    #[serde(rename = "GROUP_M")]
    pub group_m: u8,
    /// Group admin bit
    #[serde(rename = "GROUP_A")]
    pub group_a: u8,
    /// Other use bit
    #[serde(rename = "OTHER_U")]
    pub other_u: u8,
    /// Other manage bit
    #[serde(rename = "OTHER_M")]
    pub other_m: u8,
    /// Other admin bit
    #[serde(rename = "OTHER_A")]
    pub other_a: u8,
}

impl Permissions {
    /// Parse a 3-character octal-style permission string (owner, group,
    /// other; use = 4, manage = 2, admin = 1).
    ///
    /// Validation happens here, before any remote call: the string must be
    /// exactly 3 characters, each in `'0'..='7'`.
    pub fn from_octal_str(s: &str) -> Result<Self> {
        let digits: Vec<char> = s.chars().collect();
        if digits.len() != 3 {
            return Err(Error::validation(format!(
                "permission string {s:?} must specify 3 sets: owner-group-other"
            )));
        }
        let mut classes = [0u32; 3];
        for (i, c) in digits.iter().enumerate() {
            match c.to_digit(8) {
                Some(d) => classes[i] = d,
                None => {
                    return Err(Error::validation(format!(
                        "permission string {s:?} has invalid character {c:?}, \
                         each set must be a number from 0 to 7"
                    )));
                }
            }
        }

        let bits = |d: u32| -> (u8, u8, u8) {
            (
                u8::from(d & 0b100 != 0),
                u8::from(d & 0b010 != 0),
                u8::from(d & 0b001 != 0),
            )
        };
        let (owner_u, owner_m, owner_a) = bits(classes[0]);
        let (group_u, group_m, group_a) = bits(classes[1]);
        let (other_u, other_m, other_a) = bits(classes[2]);

        Ok(Self {
            owner_u,
            owner_m,
            owner_a,
            group_u,
            group_m,
            group_a,
            other_u,
            other_m,
            other_a,
        })
    }

    /// Render back to the 3-character octal-style string.
    pub fn to_octal_string(&self) -> String {
        let digit = |u: u8, m: u8, a: u8| u * 4 + m * 2 + a;
        format!(
            "{}{}{}",
            digit(self.owner_u, self.owner_m, self.owner_a),
            digit(self.group_u, self.group_m, self.group_a),
            digit(self.other_u, self.other_m, self.other_a),
        )
    }

    /// The nine bits in the argument order of `one.vm.chmod`.
    pub fn chmod_args(&self) -> [i64; 9] {
        [
            i64::from(self.owner_u),
            i64::from(self.owner_m),
            i64::from(self.owner_a),
            i64::from(self.group_u),
            i64::from(self.group_m),
            i64::from(self.group_a),
            i64::from(self.other_u),
            i64::from(self.other_m),
            i64::from(self.other_a),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_all_valid_strings() {
        for owner in 0..8 {
            for group in 0..8 {
                for other in 0..8 {
                    let s = format!("{owner}{group}{other}");
                    let perms = Permissions::from_octal_str(&s).unwrap();
                    assert_eq!(perms.to_octal_string(), s);
                }
            }
        }
    }

    #[test]
    fn test_default_permission_bits() {
        let perms = Permissions::from_octal_str("640").unwrap();
        assert_eq!(perms.owner_u, 1);
        assert_eq!(perms.owner_m, 1);
        assert_eq!(perms.owner_a, 0);
        assert_eq!(perms.group_u, 1);
        assert_eq!(perms.group_m, 0);
        assert_eq!(perms.other_u, 0);
    }

    #[test]
    fn test_rejects_wrong_length() {
        assert!(Permissions::from_octal_str("64").unwrap_err().is_validation());
        assert!(
            Permissions::from_octal_str("6400")
                .unwrap_err()
                .is_validation()
        );
        assert!(Permissions::from_octal_str("").unwrap_err().is_validation());
    }

    #[test]
    fn test_rejects_out_of_range_characters() {
        assert!(Permissions::from_octal_str("680").unwrap_err().is_validation());
        assert!(Permissions::from_octal_str("64a").unwrap_err().is_validation());
        assert!(Permissions::from_octal_str("-40").unwrap_err().is_validation());
    }

    #[test]
    fn test_chmod_args_order() {
        let perms = Permissions::from_octal_str("640").unwrap();
        assert_eq!(perms.chmod_args(), [1, 1, 0, 1, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_decode_from_xml() {
        let xml = r"
            <PERMISSIONS>
              <OWNER_U>1</OWNER_U>
              <OWNER_M>1</OWNER_M>
              <OWNER_A>0</OWNER_A>
              <GROUP_U>1</GROUP_U>
              <GROUP_M>0</GROUP_M>
              <GROUP_A>0</GROUP_A>
              <OTHER_U>0</OTHER_U>
              <OTHER_M>0</OTHER_M>
              <OTHER_A>0</OTHER_A>
            </PERMISSIONS>";
        let perms: Permissions = quick_xml::de::from_str(xml).unwrap();
        assert_eq!(perms.to_octal_string(), "640");
    }
}
