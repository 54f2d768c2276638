// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Rendering of X.501 names and object identifiers for humans.

use rasn::types::{
    Any, AsnType, BmpString, Ia5String, Implicit, OctetString, PrintableString, Tag, Utf8String
};
use rasn_pkix::{AlgorithmIdentifier, AttributeTypeAndValue, Name, RelativeDistinguishedName};

/// An algorithm identifier's OID, with a readable name when we know it.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct AlgorithmSummary {
    pub oid: String,
    pub name: Option<&'static str>
}

impl AlgorithmSummary {
    pub fn from_identifier(identifier: &AlgorithmIdentifier) -> AlgorithmSummary {
        let oid = oid_string(&identifier.algorithm);
        AlgorithmSummary {
            name: algorithm_name(&oid),
            oid
        }
    }

    /// The readable name if there is one, otherwise the dotted OID.
    pub fn display_name(&self) -> &str {
        self.name.unwrap_or(&self.oid)
    }
}

pub fn oid_string(arcs: &[u32]) -> String {
    arcs.iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

fn algorithm_name(oid: &str) -> Option<&'static str> {
    Some(match oid {
        "1.2.840.113549.1.1.1" => "RSA",
        "1.2.840.113549.1.1.4" => "MD5withRSA",
        "1.2.840.113549.1.1.5" => "SHA1withRSA",
        "1.2.840.113549.1.1.10" => "RSASSA-PSS",
        "1.2.840.113549.1.1.11" => "SHA256withRSA",
        "1.2.840.113549.1.1.12" => "SHA384withRSA",
        "1.2.840.113549.1.1.13" => "SHA512withRSA",
        "1.2.840.10045.2.1" => "EC",
        "1.2.840.10045.4.3.2" => "SHA256withECDSA",
        "1.2.840.10045.4.3.3" => "SHA384withECDSA",
        "1.2.840.10045.4.3.4" => "SHA512withECDSA",
        "1.2.840.10040.4.1" => "DSA",
        "1.2.840.10040.4.3" => "SHA1withDSA",
        "2.16.840.1.101.3.4.3.2" => "SHA256withDSA",
        "1.3.101.112" => "Ed25519",
        _ => return None
    })
}

fn attribute_short_name(oid: &str) -> Option<&'static str> {
    Some(match oid {
        "2.5.4.3" => "CN",
        "2.5.4.4" => "SURNAME",
        "2.5.4.5" => "SERIALNUMBER",
        "2.5.4.6" => "C",
        "2.5.4.7" => "L",
        "2.5.4.8" => "ST",
        "2.5.4.9" => "STREET",
        "2.5.4.10" => "O",
        "2.5.4.11" => "OU",
        "2.5.4.12" => "T",
        "0.9.2342.19200300.100.1.1" => "UID",
        "0.9.2342.19200300.100.1.25" => "DC",
        "1.2.840.113549.1.9.1" => "EMAILADDRESS",
        _ => return None
    })
}

/// Formats a name like RFC 4514 does: most specific RDN first,
/// `CN=Android Debug, O=Android, C=US`.
///
/// Values that aren't a directory string print as `#` and the hex of their
/// DER encoding.
pub fn format_name(name: &Name) -> String {
    let Name::RdnSequence(rdns) = name;
    rdns.iter()
        .rev()
        .map(format_rdn)
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_rdn(rdn: &RelativeDistinguishedName) -> String {
    // SET OF has no order of its own
    let mut attributes = rdn
        .to_vec()
        .into_iter()
        .map(format_attribute)
        .collect::<Vec<_>>();
    attributes.sort();
    attributes.join("+")
}

fn format_attribute(attribute: &AttributeTypeAndValue) -> String {
    let oid = oid_string(&attribute.r#type);
    let key = attribute_short_name(&oid).map_or(oid, str::to_string);
    let value = match decode_directory_string(&attribute.value) {
        Some(text) => escape_value(&text),
        None => format!("#{}", hex::encode(attribute.value.as_bytes()))
    };
    format!("{key}={value}")
}

struct TeletexTag;

impl AsnType for TeletexTag {
    const TAG: Tag = Tag::TELETEX_STRING;
}

/// T.61 text read as Latin-1, which is what signing tools put there in
/// practice.
type TeletexOctets = Implicit<TeletexTag, OctetString>;

fn decode_directory_string(value: &Any) -> Option<String> {
    let der = value.as_bytes();
    rasn::der::decode::<Utf8String>(der)
        .ok()
        .or_else(|| {
            let text = rasn::der::decode::<PrintableString>(der).ok()?;
            String::from_utf8(text.as_bytes().to_vec()).ok()
        })
        .or_else(|| rasn::der::decode::<Ia5String>(der).ok().map(String::from))
        .or_else(|| {
            let text = rasn::der::decode::<BmpString>(der).ok()?;
            char::decode_utf16(text.iter().copied())
                .collect::<Result<String, _>>()
                .ok()
        })
        .or_else(|| {
            let text = rasn::der::decode::<TeletexOctets>(der).ok()?;
            Some(text.iter().copied().map(char::from).collect())
        })
}

fn escape_value(value: &str) -> String {
    let last = value.chars().count().saturating_sub(1);
    let mut escaped = String::with_capacity(value.len());
    for (i, c) in value.chars().enumerate() {
        let special = matches!(c, ',' | '+' | '"' | '\\' | '<' | '>' | ';')
            || (i == 0 && (c == '#' || c == ' '))
            || (i == last && c == ' ');
        if special {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
