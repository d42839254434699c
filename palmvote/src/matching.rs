use crate::*;

/// Minimum similarity for a scan to count as the registered voter
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.80;

/// Cosine similarity of two templates, treating bytes as unsigned values.
///
/// Only the common prefix is compared. Empty or all-zero input scores 0;
/// the result is clamped to [0, 1].
pub fn similarity(a: &[u8], b: &[u8]) -> f64 {
    let len = a.len().min(b.len());
    if len == 0 {
        return 0.0;
    }

    let (mut dot, mut mag_a, mut mag_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a[..len].iter().zip(&b[..len]) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        mag_a += x * x;
        mag_b += y * y;
    }
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    (dot / (mag_a.sqrt() * mag_b.sqrt())).max(0.0).min(1.0)
}

/// Best score of a scanned template against a voter's stored templates.
///
/// The scan is opened with `scan_key` when the client sealed it under a
/// session key, otherwise with the voter's own template key. Any failure to
/// open scores 0.
pub fn score_scan(templates: &PalmTemplates, sealed_scan: &str, scan_key: Option<&TemplateKey>) -> f64 {
    let key = match templates.key.as_ref() {
        Some(key) => key,
        None => return 0.0,
    };
    if sealed_scan.trim().is_empty() {
        return 0.0;
    }

    let scanned = match crypto::open(scan_key.unwrap_or(key), sealed_scan) {
        Ok(plain) if !plain.is_empty() => plain,
        _ => return 0.0,
    };

    templates
        .sealed()
        .filter_map(|sealed| crypto::open(key, sealed).ok())
        .map(|stored| similarity(&stored, &scanned))
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_bounds() {
        assert!((similarity(&[1, 2, 3], &[1, 2, 3]) - 1.0).abs() < 1e-12);
        assert!((similarity(&[10, 20], &[20, 40]) - 1.0).abs() < 1e-12);
        assert_eq!(similarity(&[255, 0], &[0, 255]), 0.0);
        assert_eq!(similarity(&[], &[1, 2]), 0.0);
        assert_eq!(similarity(&[0, 0, 0], &[1, 2, 3]), 0.0);

        // Only the common prefix counts
        assert!((similarity(&[5, 5], &[5, 5, 200, 1]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn scan_against_registered_templates() {
        let key = TemplateKey::generate();
        let left: Vec<u8> = (0..=255u8).collect();
        let right: Vec<u8> = (0..=255u8).rev().collect();

        let templates = PalmTemplates {
            left: Some(crypto::seal(&key, &left).unwrap()),
            right: Some(crypto::seal(&key, &right).unwrap()),
            key: Some(key),
        };

        // Same hand sealed under the voter's key
        let scan = crypto::seal(&key, &right).unwrap();
        assert!((score_scan(&templates, &scan, None) - 1.0).abs() < 1e-9);

        // Sealed under a session key the client sends along
        let session = TemplateKey::generate();
        let scan = crypto::seal(&session, &left).unwrap();
        assert!(score_scan(&templates, &scan, Some(&session)) > 0.999);
        assert_eq!(score_scan(&templates, &scan, None), 0.0);

        // A voter without templates never matches
        assert_eq!(score_scan(&PalmTemplates::default(), &scan, Some(&session)), 0.0);
        assert_eq!(score_scan(&templates, "  ", None), 0.0);
    }
}
