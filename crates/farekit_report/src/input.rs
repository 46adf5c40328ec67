//! Free-text parsing of extension and group mappings.

use crate::conf::C_GROUP_KEY_PREFIX;
use crate::spec::{ExtensionMap, SpecEmployeeGroups};

/// Parse `id: extension` lines; lines without exactly one `:` are dropped.
///
/// A later line for the same identifier overwrites the earlier one.
pub fn parse_extension_map(text: &str) -> ExtensionMap {
    let mut dict_extensions = ExtensionMap::new();
    for c_line in text.lines() {
        let c_line = c_line.trim();
        if c_line.is_empty() {
            continue;
        }
        let l_parts: Vec<&str> = c_line.split(':').collect();
        if let [c_id, c_extension] = l_parts.as_slice() {
            dict_extensions.insert(c_id.trim().to_string(), c_extension.trim().to_string());
        }
    }
    dict_extensions
}

/// Parse one group per line of comma-separated identifiers.
///
/// Keys are `Group_<line number>` (1-based, counting blank lines). Empty
/// members are dropped; a line with no members declares nothing.
pub fn parse_employee_groups(text: &str) -> SpecEmployeeGroups {
    let mut groups = SpecEmployeeGroups::default();
    for (n_idx_line, c_line) in text.lines().enumerate() {
        let l_members: Vec<String> = c_line
            .split(',')
            .map(str::trim)
            .filter(|c_member| !c_member.is_empty())
            .map(ToString::to_string)
            .collect();
        if l_members.is_empty() {
            continue;
        }
        groups.push(format!("{C_GROUP_KEY_PREFIX}{}", n_idx_line + 1), l_members);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extension_map_drops_malformed_lines() {
        let dict_extensions =
            parse_extension_map("001: 6312\n\nbad line\n002:7:8\n 003 :  101 \r\n");

        assert_eq!(dict_extensions.len(), 2);
        assert_eq!(dict_extensions["001"], "6312");
        assert_eq!(dict_extensions["003"], "101");
    }

    #[test]
    fn test_parse_employee_groups_keys_follow_line_numbers() {
        let groups = parse_employee_groups("001, 002\n\n 003 ,, 004 \n,");

        assert_eq!(groups.groups.len(), 2);
        assert_eq!(groups.groups[0].key, "Group_1");
        assert_eq!(groups.groups[0].members, vec!["001", "002"]);
        assert_eq!(groups.groups[1].key, "Group_3");
        assert_eq!(groups.groups[1].members, vec!["003", "004"]);
    }

    #[test]
    fn test_parse_employee_groups_blank_text_declares_nothing() {
        assert!(parse_employee_groups("").is_empty());
        assert!(parse_employee_groups("  \n ").is_empty());
    }
}
