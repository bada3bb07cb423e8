// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test data generators for abuse simulation.

use std::net::{IpAddr, Ipv4Addr};

/// Generate a pool of client identifiers.
pub fn generate_ips(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            // Use 10.x.x.x private range
            let a = ((i >> 16) & 0xFF) as u8;
            let b = ((i >> 8) & 0xFF) as u8;
            let c = (i & 0xFF) as u8;
            IpAddr::V4(Ipv4Addr::new(10, a, b, c)).to_string()
        })
        .collect()
}

/// Generate distinct, well-formed addresses.
pub fn generate_emails(count: usize, domain: &str) -> Vec<String> {
    (0..count)
        .map(|i| format!("signup.{}@{}", i, domain))
        .collect()
}

/// Generate stacked alias variants of one mailbox.
pub fn generate_alias_stacked(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("victim+{}+{}@example.com", i, i * 7))
        .collect()
}

/// Generate spellings of `target` that normalize to the same address.
pub fn generate_case_variants(target: &str, count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            let mixed: String = target
                .chars()
                .enumerate()
                .map(|(j, c)| {
                    if (i >> (j % 8)) & 1 == 1 {
                        c.to_ascii_uppercase()
                    } else {
                        c
                    }
                })
                .collect();
            let pad = " ".repeat(i % 3);
            format!("{pad}{mixed}{pad}")
        })
        .collect()
}

/// Generate malformed email payloads.
/// Each should be rejected as malformed:
/// - no `@` or no domain dot
/// - single-letter or numeric TLD
/// - characters outside the accepted set
/// - oversized
pub fn generate_malformed_emails() -> Vec<String> {
    vec![
        "not-an-email".to_string(),
        "a@b".to_string(),
        "@example.com".to_string(),
        "user@".to_string(),
        "user@example.c".to_string(),
        "user@example.123".to_string(),
        "user name@example.com".to_string(),
        "<script>@example.com".to_string(),
        "user@@example.com".to_string(),
        "   ".to_string(),
        format!("{}@example.com", "z".repeat(300)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ips() {
        let ips = generate_ips(256);
        assert_eq!(ips.len(), 256);
        // All should be unique
        let unique: std::collections::HashSet<_> = ips.iter().collect();
        assert_eq!(unique.len(), 256);
    }

    #[test]
    fn test_case_variants_differ() {
        let variants = generate_case_variants("victim@example.com", 8);
        let unique: std::collections::HashSet<_> = variants.iter().collect();
        assert_eq!(unique.len(), 8);
        assert!(variants
            .iter()
            .all(|v| v.trim().to_lowercase() == "victim@example.com"));
    }
}
