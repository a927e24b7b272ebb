//! A naive email-address miner: finds an `@`, then validates the user
//! part to its left and the domain part to its right without any DNS
//! or MX-record awareness — hence "naive".

use std::sync::Arc;

use crate::miner::{Dir, Matcher, MatcherFn, Miner, Occurrence};

fn is_email_char(b: &[u8]) -> bool {
    let (c, _) = crate::predicates::decode_codepoint(b);
    crate::predicates::is_alnum(b) || matches!(c, '-' | '.' | '_')
}

fn is_domain_char(b: &[u8]) -> bool {
    is_email_char(b) && crate::predicates::decode_codepoint(b).0 != '.'
}

/// Moves one codepoint left of the `@` and greedily consumes user-part
/// characters leftward, marking the match start at the leftmost one.
fn validate_left_context(m: &mut Miner) -> bool {
    if !m.step(Dir::Left) {
        return false;
    }
    if m.match_fn_plus(is_email_char, Dir::Left) {
        m.mark_start();
        true
    } else {
        false
    }
}

/// Moves one codepoint right of the `@` and consumes subdomain labels
/// separated by `.`, requiring at least two labels and a final label of
/// at least two characters (`a.co`, not `a.c`).
fn validate_domain(m: &mut Miner) -> bool {
    if !m.step(Dir::Right) {
        return false;
    }
    let mut subdomains = 0u32;
    let mut last_subdomain_start = m.mark_pos();

    loop {
        while m.match_fn(is_domain_char, Dir::Right) {}
        if m.match_one(&['.'], Dir::Right) {
            subdomains += 1;
            last_subdomain_start = m.mark_pos();
        } else {
            subdomains += 1;
            m.mark_end();
            break;
        }
    }

    if subdomains < 2 {
        return false;
    }
    let end = m.mark_pos();
    end.pos as i64 - last_subdomain_start.pos as i64 >= 2
}

/// The naive email miner: case-sensitive, ASCII/Unicode alnum-aware, no
/// quoted local parts and no bracketed IP-literal domains.
pub struct EmailMiner;

impl Matcher for EmailMiner {
    fn matcher_fn(&self) -> Arc<MatcherFn> {
        Arc::new(|m: &mut Miner| -> Option<Occurrence> {
            if !m.match_one(&['@'], Dir::Stay) {
                return None;
            }
            let at_sign = m.mark_pos();

            if !validate_left_context(m) {
                return None;
            }
            m.reset_pos(at_sign);

            if !validate_domain(m) {
                return None;
            }
            m.make_occurrence(1.0)
        })
    }
}
