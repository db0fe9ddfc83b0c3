//! "Role required:" lines name ServiceNow roles; role names render as code.
//!
//! Only identifier-like tokens are marked: `admin`, `sn_hr_core.manager`.
//! Natural-language answers such as `No` or `none` stay plain.

use super::Piece;
use once_cell::sync::Lazy;
use regex::Regex;

static ROLE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\broles? required:").expect("valid role prefix regex"));
static ROLE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_.]*$").expect("valid role name regex"));

const NATURAL_WORDS: &[&str] = &[
    "no", "none", "yes", "any", "and", "or", "n/a", "not", "all", "only", "the", "a", "an",
    "either", "both", "with", "of", "for", "to", "is", "are", "role", "roles", "required",
];

const CONNECTORS: &[&str] = &["and", "or"];

pub fn is_role_name(token: &str) -> bool {
    ROLE_NAME.is_match(token) && !NATURAL_WORDS.contains(&token)
}

/// Where a role list stands between tokens.
#[derive(Debug, Clone, Copy)]
struct RoleList {
    /// At the start, or after a comma or connector word.
    expect_item: bool,
}

/// Marks role names that follow a "Role required:" prefix as code.
///
/// The list is role names joined by commas, `and` or `or`. It ends at a
/// line break, a semicolon, a full stop, or the first word that is neither
/// a role in item position nor a connector, so `none, but you need access`
/// stays plain. Pieces that are already code or links are left untouched.
pub fn mark_role_names(pieces: Vec<Piece>) -> Vec<Piece> {
    let mut out = Vec::with_capacity(pieces.len());
    let mut list: Option<RoleList> = None;

    for piece in pieces {
        if piece.annotations.code || piece.link.is_some() {
            list = match list {
                Some(_) if piece.text.contains('\n') => None,
                Some(_) => Some(RoleList { expect_item: false }),
                None => None,
            };
            out.push(piece);
            continue;
        }

        let mut rest = piece.text.as_str();
        let mut segments: Vec<(String, bool)> = Vec::new();
        loop {
            if list.is_none() {
                match ROLE_PREFIX.find(rest) {
                    Some(prefix) => {
                        push_plain(&mut segments, &rest[..prefix.end()]);
                        rest = &rest[prefix.end()..];
                        list = Some(RoleList { expect_item: true });
                    }
                    None => {
                        push_plain(&mut segments, rest);
                        break;
                    }
                }
            }
            let Some(state) = list.as_mut() else {
                break;
            };
            let (consumed, ended) = state.scan(rest, &mut segments);
            rest = &rest[consumed..];
            if ended {
                list = None;
            }
            if rest.is_empty() {
                break;
            }
        }

        for (text, is_role) in segments {
            if text.is_empty() {
                continue;
            }
            let mut annotations = piece.annotations;
            annotations.code = is_role;
            out.push(Piece {
                text,
                annotations,
                link: None,
            });
        }
    }
    out
}

impl RoleList {
    /// Tokenizes the role list at the start of `text`.
    ///
    /// Returns the number of bytes consumed and whether the list ended.
    /// Text after the end is left unconsumed.
    fn scan(&mut self, text: &str, segments: &mut Vec<(String, bool)>) -> (usize, bool) {
        let mut index = 0;

        while index < text.len() {
            let rest = &text[index..];
            let token_len = rest
                .char_indices()
                .find(|(_, c)| !(c.is_alphanumeric() || matches!(c, '_' | '.' | '/')))
                .map(|(i, _)| i)
                .unwrap_or(rest.len());

            if token_len == 0 {
                let Some(c) = rest.chars().next() else {
                    break;
                };
                match c {
                    '\n' | ';' => {
                        push_plain(segments, &rest[..c.len_utf8()]);
                        return (index + c.len_utf8(), true);
                    }
                    ',' => self.expect_item = true,
                    c if c.is_whitespace() => {}
                    _ => return (index, true),
                }
                push_plain(segments, &rest[..c.len_utf8()]);
                index += c.len_utf8();
                continue;
            }

            let token = &rest[..token_len];
            let trimmed = token.trim_end_matches('.');
            if CONNECTORS.contains(&trimmed) && trimmed.len() == token.len() {
                push_plain(segments, trimmed);
                self.expect_item = true;
                index += token_len;
                continue;
            }
            if !self.expect_item || !is_role_name(trimmed) {
                return (index, true);
            }

            segments.push((trimmed.to_string(), true));
            self.expect_item = false;
            let dots = &token[trimmed.len()..];
            index += token_len;
            if !dots.is_empty() {
                push_plain(segments, dots);
                // "admin." closes the sentence unless more text is glued on
                let next = text[index..].chars().next();
                if next.map_or(true, char::is_whitespace) {
                    return (index, true);
                }
            }
        }
        (index, false)
    }
}

fn push_plain(segments: &mut Vec<(String, bool)>, text: &str) {
    match segments.last_mut() {
        Some((last, false)) => last.push_str(text),
        _ => segments.push((text.to_string(), false)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Annotations;

    fn plain(text: &str) -> Piece {
        Piece {
            text: text.to_string(),
            annotations: Annotations::default(),
            link: None,
        }
    }

    fn rendered(pieces: Vec<Piece>) -> Vec<(String, bool)> {
        pieces
            .into_iter()
            .map(|p| (p.text, p.annotations.code))
            .collect()
    }

    #[test]
    fn natural_language_answer_stays_plain() {
        assert_eq!(
            rendered(mark_role_names(vec![plain("Role required: No")])),
            vec![("Role required: No".to_string(), false)]
        );
    }

    #[test]
    fn role_names_become_code() {
        assert_eq!(
            rendered(mark_role_names(vec![plain(
                "Role required: admin or sn_hr_core.manager. Then save."
            )])),
            vec![
                ("Role required: ".to_string(), false),
                ("admin".to_string(), true),
                (" or ".to_string(), false),
                ("sn_hr_core.manager".to_string(), true),
                (". Then save.".to_string(), false),
            ]
        );
    }

    #[test]
    fn role_list_spans_pieces() {
        let mut bold = plain("Role required:");
        bold.annotations.bold = true;
        let result = mark_role_names(vec![bold, plain(" itil")]);
        assert_eq!(result.last().map(|p| p.annotations.code), Some(true));
        assert_eq!(result.last().map(|p| p.text.as_str()), Some("itil"));
    }

    #[test]
    fn answer_followed_by_prose_stays_plain() {
        assert_eq!(
            rendered(mark_role_names(vec![plain(
                "Role required: none, but you need access to the instance"
            )])),
            vec![(
                "Role required: none, but you need access to the instance".to_string(),
                false
            )]
        );
    }

    #[test]
    fn comma_and_or_separate_roles() {
        let result = rendered(mark_role_names(vec![plain(
            "Role required: itil, catalog_admin, or sn_request_write",
        )]));
        let roles: Vec<&str> = result
            .iter()
            .filter(|(_, code)| *code)
            .map(|(text, _)| text.as_str())
            .collect();
        assert_eq!(roles, vec!["itil", "catalog_admin", "sn_request_write"]);
    }

    #[test]
    fn list_ends_where_the_sentence_continues() {
        assert_eq!(
            rendered(mark_role_names(vec![plain(
                "Role required: admin or itil to manage records"
            )])),
            vec![
                ("Role required: ".to_string(), false),
                ("admin".to_string(), true),
                (" or ".to_string(), false),
                ("itil".to_string(), true),
                (" to manage records".to_string(), false),
            ]
        );
    }

    #[test]
    fn list_state_carries_across_pieces() {
        let mut bold = plain("admin");
        bold.annotations.bold = true;
        let result = rendered(mark_role_names(vec![
            plain("Role required: "),
            bold,
            plain(" you need"),
        ]));
        assert_eq!(
            result,
            vec![
                ("Role required: ".to_string(), false),
                ("admin".to_string(), true),
                (" you need".to_string(), false),
            ]
        );
    }

    #[test]
    fn role_name_rule() {
        assert!(is_role_name("admin"));
        assert!(is_role_name("x_snc_app.user"));
        assert!(!is_role_name("none"));
        assert!(!is_role_name("Admin"));
    }
}
