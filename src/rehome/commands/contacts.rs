use super::ImportReport;
use crate::error::Result;
use crate::model::{Contact, ContactAddress, ContactEmail, ContactName, ContactPhone};
use crate::store::DocStore;
use crate::vcard::{self, VCard, VCardProperty};
use std::io::Read;

/// Parses one vCard entry and stores it as a contact.
pub fn create_contact<D: DocStore, R: Read>(
    docs: &mut D,
    content: &mut R,
    report: &mut ImportReport,
) -> Result<Contact> {
    let mut raw = Vec::new();
    content.read_to_end(&mut raw)?;

    // Legacy exports are not always UTF-8
    let card = vcard::parse_single(&String::from_utf8_lossy(&raw))?;
    let mut contact = contact_from_vcard(&card);
    contact.normalize();
    docs.create_doc(&mut contact)?;

    tracing::debug!(fullname = %contact.full_name, "Contact created");
    report.contacts += 1;
    Ok(contact)
}

/// Maps a card onto a contact. Missing optional properties never fail; a card
/// without `N` gets the placeholder identity.
pub fn contact_from_vcard(card: &VCard) -> Contact {
    let (name, mut full_name) = match card.name() {
        Some(n) => {
            let name = ContactName {
                family_name: n.family,
                given_name: n.given,
                additional_name: n.additional,
                name_prefix: n.prefix,
                name_suffix: n.suffix,
            };
            let full_name = name.display_name();
            (name, full_name)
        }
        None => {
            let name = ContactName::placeholder();
            let full_name = name.display_name();
            (name, full_name)
        }
    };
    if let Some(formatted) = card.formatted_name() {
        full_name = formatted;
    }

    let email = card
        .all("EMAIL")
        .map(|p| ContactEmail {
            address: p.text(),
            kind: kind_of(p),
            label: String::new(),
            primary: p.is_preferred(),
        })
        .collect();

    let phone = card
        .all("TEL")
        .map(|p| ContactPhone {
            number: p.text(),
            kind: kind_of(p),
            label: String::new(),
            primary: p.is_preferred(),
        })
        .collect();

    let address = card
        .addresses()
        .into_iter()
        .map(|(p, adr)| {
            let formatted_address = p
                .param("LABEL")
                .and_then(|l| l.value())
                .map(vcard::unescape_text)
                .unwrap_or_else(|| adr.one_line());
            ContactAddress {
                street: adr.street,
                pobox: adr.po_box,
                city: adr.locality,
                region: adr.region,
                postcode: adr.postal_code,
                country: adr.country,
                kind: kind_of(p),
                primary: p.is_preferred(),
                label: String::new(),
                formatted_address,
            }
        })
        .collect();

    Contact {
        id: None,
        rev: None,
        full_name,
        name,
        birthday: card.get("BDAY").map(|p| p.value.clone()).unwrap_or_default(),
        note: card.get("NOTE").map(VCardProperty::text).unwrap_or_default(),
        email,
        address,
        phone,
    }
}

// First TYPE value that is not the "pref" marker
fn kind_of(property: &VCardProperty) -> String {
    property
        .types()
        .into_iter()
        .find(|t| t != "pref")
        .unwrap_or_default()
}
