use super::{Doc, CONTACTS_DOCTYPE};
use crate::error::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactName {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub family_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub given_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub additional_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name_prefix: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name_suffix: String,
}

impl ContactName {
    /// Stand-in identity used when a card carries no `N` property.
    pub fn placeholder() -> Self {
        Self {
            family_name: "Doe".to_string(),
            given_name: "John".to_string(),
            ..Self::default()
        }
    }

    /// "Prefix Given Additional Family Suffix", skipping empty parts.
    pub fn display_name(&self) -> String {
        [
            &self.name_prefix,
            &self.given_name,
            &self.additional_name,
            &self.family_name,
            &self.name_suffix,
        ]
        .iter()
        .filter(|part| !part.is_empty())
        .map(|part| part.as_str())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactEmail {
    pub address: String,
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub primary: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactAddress {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub street: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pobox: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub city: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub region: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub postcode: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub country: String,
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub primary: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub formatted_address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactPhone {
    pub number: String,
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub primary: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,

    #[serde(rename = "fullname", default, skip_serializing_if = "String::is_empty")]
    pub full_name: String,
    #[serde(default)]
    pub name: ContactName,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub birthday: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub note: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub email: Vec<ContactEmail>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub address: Vec<ContactAddress>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phone: Vec<ContactPhone>,
}

impl Contact {
    /// Clears identity so the document store assigns a fresh one.
    pub fn normalize(&mut self) {
        self.id = None;
        self.rev = None;
    }
}

impl Doc for Contact {
    fn doctype(&self) -> &str {
        CONTACTS_DOCTYPE
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn rev(&self) -> Option<&str> {
        self.rev.as_deref()
    }

    fn set_id(&mut self, id: Option<String>) {
        self.id = id;
    }

    fn set_rev(&mut self, rev: Option<String>) {
        self.rev = rev;
    }

    fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_name() {
        let name = ContactName::placeholder();
        assert_eq!(name.given_name, "John");
        assert_eq!(name.family_name, "Doe");
        assert_eq!(name.display_name(), "John Doe");
    }

    #[test]
    fn test_display_name_skips_empty_parts() {
        let name = ContactName {
            family_name: "Lovelace".to_string(),
            given_name: "Ada".to_string(),
            name_prefix: "Countess".to_string(),
            ..ContactName::default()
        };
        assert_eq!(name.display_name(), "Countess Ada Lovelace");
    }

    #[test]
    fn test_normalize_clears_identity() {
        let mut contact = Contact {
            id: Some("old-id".to_string()),
            rev: Some("3-abc".to_string()),
            full_name: "Ada".to_string(),
            ..Contact::default()
        };
        contact.normalize();
        assert_eq!(contact.id(), None);
        assert_eq!(contact.rev(), None);
        assert_eq!(contact.full_name, "Ada");
    }

    #[test]
    fn test_json_shape() {
        let contact = Contact {
            full_name: "Ada Lovelace".to_string(),
            name: ContactName {
                family_name: "Lovelace".to_string(),
                given_name: "Ada".to_string(),
                ..ContactName::default()
            },
            email: vec![ContactEmail {
                address: "ada@example.com".to_string(),
                kind: "work".to_string(),
                primary: true,
                ..ContactEmail::default()
            }],
            ..Contact::default()
        };

        let json = contact.to_json().unwrap();
        assert_eq!(json["fullname"], "Ada Lovelace");
        assert_eq!(json["name"]["familyName"], "Lovelace");
        assert_eq!(json["email"][0]["type"], "work");
        assert_eq!(json["email"][0]["primary"], true);
        assert!(json.get("_id").is_none());
        assert!(json.get("phone").is_none());
    }
}
