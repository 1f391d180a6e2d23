//! Golden identifier vectors.
//!
//! Identifiers already stored on devices must keep matching their content,
//! so these values are fixed. A failing vector means the canonical text
//! changed.

use netcfg_core::{decode_filter, decode_rule, generate_identifier, Identified};
use serde_json::Value;

/// The kind of input a vector hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorInput {
    /// Text hashed as-is.
    Text,
    /// A raw filter record.
    Filter,
    /// A raw rule record.
    Rule,
}

/// A golden test vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    pub input: VectorInput,
    /// Text or JSON record.
    pub data: &'static str,
    /// Expected identifier.
    pub expected: &'static str,
}

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        text("empty string", "", "X-da39a3ee5e6b4b0d3255bfef95601890afd80709"),
        text("empty array", "[]", "X-97d170e1550eee4afc0af065b78cda302a97674c"),
        text("empty object", "{}", "X-bf21a9e8fbc5a3846fb05b4fa0859e0917b2202f"),
        text("spaced object", "{\"x\": 4}", "X-0e9495c7713dd296e29911123274e2a4e6ab6470"),
        text(
            "indented array",
            "[\n  {\n    \"g\": \"h\"\n  }\n]",
            "X-b5634d5772f590b6d8dc6e79daf6210dc397ca46",
        ),
        GoldenVector {
            name: "filter tcp/443",
            input: VectorInput::Filter,
            data: r#"{"services": [{"protocol": "tcp", "port_low": 443}]}"#,
            expected: "X-050935040a509710b340d494fdfa7731ac5003bd",
        },
        GoldenVector {
            name: "filter udp/514 and udp/3000-3009",
            input: VectorInput::Filter,
            data: r#"{"services": [
                {"protocol": "udp", "port_low": 514},
                {"protocol": "udp", "port_low": 3000, "port_high": 3009}
            ]}"#,
            expected: "X-0a4d107b26cdb5a36d8fca3dbb8acdb697385281",
        },
        GoldenVector {
            name: "filter icmp",
            input: VectorInput::Filter,
            data: r#"{"services": [{"protocol": "icmp"}]}"#,
            expected: "X-4183ca61d4fe56bb913ec7cc344eff1123648f52",
        },
        GoldenVector {
            name: "filter icmp and tcp/80",
            input: VectorInput::Filter,
            data: r#"{"services": [{"protocol": "tcp", "port_low": 80}, {"protocol": "icmp"}]}"#,
            expected: "X-88f468b855e771f0073ec71af6d973db8faefd1e",
        },
        GoldenVector {
            name: "filter tcp/80 and udp/5000-5010",
            input: VectorInput::Filter,
            data: r#"{"services": [
                {"protocol": "udp", "port_low": 5000, "port_high": 5010},
                {"protocol": "tcp", "port_low": 80}
            ]}"#,
            expected: "X-38ef6dade7ebcdc285ccbee8261b3249c8b44d0d",
        },
        GoldenVector {
            name: "rule host to host icmp",
            input: VectorInput::Rule,
            data: r#"{
                "sources": [{"ip_low": "10.1.3.173"}],
                "destinations": [{"ip_low": "172.31.0.200"}],
                "packet_filter": {"services": [{"protocol": "icmp"}]}
            }"#,
            expected: "X-85ccc1a107a3a30134972666b36b8cc03d84f7e2",
        },
        GoldenVector {
            name: "rule network to range with owners",
            input: VectorInput::Rule,
            data: r#"{
                "sources": [{"ip_low": "10.0.0.0/8"}],
                "destinations": [{"ip_low": "192.168.1.1", "ip_high": "192.168.1.100"}],
                "packet_filter": {"services": [
                    {"protocol": "tcp", "port_low": 80},
                    {"protocol": "udp", "port_low": 5000, "port_high": 5010}
                ]},
                "owners": ["X-o2", "X-o1"]
            }"#,
            expected: "X-6e6fa851ae01bd747bdb1b8c51c38184b183a4ed",
        },
        GoldenVector {
            name: "rule two sources",
            input: VectorInput::Rule,
            data: r#"{
                "sources": [{"ip_low": "10.1.1.2"}, {"ip_low": "20.2.2.2"}],
                "destinations": [{"ip_low": "10.1.1.2"}, {"ip_low": "20.2.2.2"}],
                "packet_filter": {"services": [{"protocol": "icmp"}]},
                "owners": ["X-o1"]
            }"#,
            expected: "X-6685297ab69d30290582b26eec2bde3f37b6e7c2",
        },
        GoldenVector {
            name: "rule two sources reversed",
            input: VectorInput::Rule,
            data: r#"{
                "sources": [{"ip_low": "20.2.2.2"}, {"ip_low": "10.1.1.2"}],
                "destinations": [{"ip_low": "10.1.1.2"}, {"ip_low": "20.2.2.2"}],
                "packet_filter": {"services": [{"protocol": "icmp"}]},
                "owners": ["X-o1"]
            }"#,
            expected: "X-98b17c6b4d7fbbf35443097a2f81358ebd78f8fe",
        },
    ]
}

fn text(name: &'static str, data: &'static str, expected: &'static str) -> GoldenVector {
    GoldenVector {
        name,
        input: VectorInput::Text,
        data,
        expected,
    }
}

/// Compute the identifier a vector produces.
pub fn compute_identifier(vector: &GoldenVector) -> Result<String, String> {
    let record = || serde_json::from_str::<Value>(vector.data).map_err(|e| e.to_string());
    let id = match vector.input {
        VectorInput::Text => generate_identifier(vector.data),
        VectorInput::Filter => decode_filter(record()?)
            .map_err(|e| e.to_string())?
            .identifier()
            .clone(),
        VectorInput::Rule => decode_rule(record()?)
            .map_err(|e| e.to_string())?
            .identifier()
            .clone(),
    };
    Ok(id.into_string())
}

/// Verify all golden vectors.
///
/// Returns `(name, matches, computed)` per vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|v| {
            let computed = compute_identifier(v).unwrap_or_else(|e| format!("error: {}", e));
            (v.name.to_string(), computed == v.expected, computed)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_vectors_match() {
        for (name, matches, computed) in verify_all_vectors() {
            assert!(matches, "vector '{}' computed {}", name, computed);
        }
    }

    #[test]
    fn test_names_are_unique() {
        let vectors = all_vectors();
        let mut names: Vec<_> = vectors.iter().map(|v| v.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), vectors.len());
    }
}
