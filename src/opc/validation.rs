//! OPC part name rules

/// Problems with an OPC part name, empty when the name is acceptable
///
/// Non-ASCII characters are accepted; many real-world packages store UTF-8
/// part names directly instead of percent-encoding them.
pub(crate) fn part_name_problems(part_name: &str) -> Vec<String> {
    let mut problems = Vec::new();

    if part_name.chars().any(|c| c.is_control()) {
        problems.push(format!(
            "part name cannot contain control characters: {}",
            part_name.escape_debug()
        ));
    }

    if part_name.contains('#') {
        problems.push(format!(
            "part name cannot contain a fragment identifier: {}",
            part_name
        ));
    }

    if part_name.contains('?') {
        problems.push(format!("part name cannot contain a query string: {}", part_name));
    }

    for (idx, segment) in part_name.split('/').enumerate() {
        if segment.is_empty() {
            if idx == 0 && part_name.starts_with('/') {
                continue;
            }
            problems.push(format!(
                "part name cannot contain empty path segments: {}",
                part_name
            ));
        } else if segment == "." || segment == ".." {
            problems.push(format!(
                "part name cannot contain '.' or '..' segments: {}",
                part_name
            ));
        } else if segment.ends_with('.') {
            problems.push(format!(
                "part name segments cannot end with '.': {}",
                part_name
            ));
        }
    }

    problems
}

/// Normalize OPC path by removing leading slash
pub(crate) fn normalize_path(path: &str) -> &str {
    path.strip_prefix('/').unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_part_names() {
        assert!(part_name_problems("/3D/3dmodel.model").is_empty());
        assert!(part_name_problems("Metadata/Slic3r_PE.config").is_empty());
        assert!(part_name_problems("2D/testÆfile.model").is_empty());
    }

    #[test]
    fn test_invalid_part_names() {
        assert_eq!(part_name_problems("/3D//a.model").len(), 1);
        assert_eq!(part_name_problems("/3D/../a.model").len(), 1);
        assert_eq!(part_name_problems("/3D/a.model#x").len(), 1);
        assert_eq!(part_name_problems("/3D/a.").len(), 1);
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/3D/3dmodel.model"), "3D/3dmodel.model");
        assert_eq!(normalize_path("3D/3dmodel.model"), "3D/3dmodel.model");
    }
}
