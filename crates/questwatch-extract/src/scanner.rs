//! Anchor scanner - locates embedded structured blocks in page text.
//!
//! The page is scanned for three fixed anchor patterns: zone links, generic
//! `_[id]{...}` records, and the single quest listing. The scan is a lazy,
//! finite, restartable iterator; cursor state never leaves this module.
//! Malformed occurrences of an anchor are skipped, never errors; deciding
//! whether a *missing* anchor is fatal belongs to the caller.

/// Fixed phrase opening every zone link on the page.
pub const ZONE_LINK_ANCHOR: &str = "<a href=\"https://www.wowhead.com/zone=";

/// Fixed phrase opening every embedded record.
pub const RECORD_ANCHOR: &str = "_[";

/// Fixed phrase introducing the quest listing block.
pub const LISTING_ANCHOR: &str = "var lvWorldQuests = new Listview(";

/// One located anchor occurrence.
///
/// Spans borrow from the page text; `Record` and `Listing` spans are the
/// raw block source, ready for [`crate::parser::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anchor<'a> {
    /// A zone link: id parsed from the href, display name from the link text
    Zone {
        /// External zone id
        id: i64,
        /// Display name between the link's tags
        name: &'a str,
    },
    /// A `_[id]{...}` record: id from the anchor, brace-balanced span
    Record {
        /// External record id (meaning depends on classification)
        id: i64,
        /// Balanced block source, braces included
        span: &'a str,
    },
    /// The quest listing block, yielded at most once per scan
    Listing {
        /// Block source between the marker's `(` and the closing `);`
        span: &'a str,
    },
}

/// Scan the page for all known anchors.
///
/// Zone anchors are yielded first, then records, then the listing (if
/// present). Calling this again restarts the scan from the top.
#[must_use]
pub fn anchors(page: &str) -> Anchors<'_> {
    Anchors {
        page,
        pos: 0,
        phase: Phase::Zones,
    }
}

/// Iterator over the anchors of one page. Created by [`anchors`].
#[derive(Debug)]
pub struct Anchors<'a> {
    page: &'a str,
    pos: usize,
    phase: Phase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Zones,
    Records,
    Listing,
    Done,
}

impl<'a> Iterator for Anchors<'a> {
    type Item = Anchor<'a>;

    fn next(&mut self) -> Option<Anchor<'a>> {
        loop {
            match self.phase {
                Phase::Zones => {
                    if let Some(anchor) = self.next_zone() {
                        return Some(anchor);
                    }
                    self.phase = Phase::Records;
                    self.pos = 0;
                }
                Phase::Records => {
                    if let Some(anchor) = self.next_record() {
                        return Some(anchor);
                    }
                    self.phase = Phase::Listing;
                }
                Phase::Listing => {
                    self.phase = Phase::Done;
                    if let Some(anchor) = listing(self.page) {
                        return Some(anchor);
                    }
                }
                Phase::Done => return None,
            }
        }
    }
}

impl<'a> Anchors<'a> {
    fn next_zone(&mut self) -> Option<Anchor<'a>> {
        while let Some(found) = self.page[self.pos..].find(ZONE_LINK_ANCHOR) {
            let start = self.pos + found + ZONE_LINK_ANCHOR.len();
            // The cursor always moves past the match start, so a malformed
            // link cannot stall the scan.
            self.pos = start;
            let rest = &self.page[start..];
            let Some(slash) = rest.find('/') else { continue };
            let Ok(id) = rest[..slash].parse::<i64>() else {
                continue;
            };
            let Some(gt) = rest[slash..].find('>') else {
                continue;
            };
            let name_start = slash + gt + 1;
            let Some(lt) = rest[name_start..].find('<') else {
                continue;
            };
            let name = &rest[name_start..name_start + lt];
            self.pos = start + name_start + lt;
            return Some(Anchor::Zone { id, name });
        }
        None
    }

    fn next_record(&mut self) -> Option<Anchor<'a>> {
        while let Some(found) = self.page[self.pos..].find(RECORD_ANCHOR) {
            let id_start = self.pos + found + RECORD_ANCHOR.len();
            self.pos = id_start;
            let rest = &self.page[id_start..];
            let Some(close) = rest.find(']') else { continue };
            let Ok(id) = rest[..close].parse::<i64>() else {
                continue;
            };
            let Some(brace_rel) = rest[close..].find('{') else {
                continue;
            };
            let brace = close + brace_rel;
            match balanced_braces(&rest[brace..]) {
                Some(len) => {
                    let span = &rest[brace..brace + len];
                    self.pos = id_start + brace + len;
                    return Some(Anchor::Record { id, span });
                }
                // Unbalanced to end of input: the tail is truncated, no
                // further complete record can follow.
                None => return None,
            }
        }
        None
    }
}

/// Length of the balanced `{...}` prefix of `text`, braces included.
///
/// `text` must start at the opening brace. Returns `None` when the input
/// ends before the brace closes.
fn balanced_braces(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in text.bytes().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

fn listing(page: &str) -> Option<Anchor<'_>> {
    let start = page.find(LISTING_ANCHOR)? + LISTING_ANCHOR.len();
    let end = page[start..].find(");")?;
    Some(Anchor::Listing {
        span: &page[start..start + end],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <div><a href="https://www.wowhead.com/zone=7558/highmountain">Highmountain</a></div>
        <script>
        var g_items = {};
        g_items[141265] = _[141265]{jsonequip:{slotbak:12},name_enus:'Vantus Rune',quality:1,icon:'inv_misc'};
        _[41896]{reqclass:0,reqrace:0,name_enus:'Operation Murloc Freedom'};
        _[1090]{name_enus:'Court of Farondis'};
        var lvWorldQuests = new Listview({template:'worldquest',data:[{id:41896,ending:1483228800000,worldquesttype:1,factions:[1090],zones:[7558]}]});
        </script>
        <a href="https://www.wowhead.com/zone=7541/deadwood">Deadwood</a>
    "#;

    #[test]
    fn test_scan_yields_all_kinds_in_phase_order() {
        let found: Vec<_> = anchors(PAGE).collect();
        assert_eq!(found.len(), 6);

        assert_eq!(
            found[0],
            Anchor::Zone {
                id: 7558,
                name: "Highmountain"
            }
        );
        assert_eq!(
            found[1],
            Anchor::Zone {
                id: 7541,
                name: "Deadwood"
            }
        );
        assert!(matches!(found[2], Anchor::Record { id: 141265, .. }));
        assert!(matches!(found[3], Anchor::Record { id: 41896, .. }));
        assert!(matches!(found[4], Anchor::Record { id: 1090, .. }));
        assert!(matches!(found[5], Anchor::Listing { .. }));
    }

    #[test]
    fn test_record_span_is_balanced_inclusive() {
        let record = anchors(PAGE)
            .find_map(|a| match a {
                Anchor::Record { id: 141265, span } => Some(span),
                _ => None,
            })
            .expect("item record");
        assert!(record.starts_with("{jsonequip:{slotbak:12}"));
        assert!(record.ends_with('}'));
        assert_eq!(record.matches('{').count(), record.matches('}').count());
    }

    #[test]
    fn test_listing_span_stops_at_first_close() {
        let span = anchors(PAGE)
            .find_map(|a| match a {
                Anchor::Listing { span } => Some(span),
                _ => None,
            })
            .expect("listing anchor");
        assert!(span.starts_with("{template:'worldquest'"));
        assert!(span.ends_with('}'));
    }

    #[test]
    fn test_missing_listing_yields_no_listing_anchor() {
        let page = "_[7]{name_enus:'Alone'};";
        assert!(!anchors(page).any(|a| matches!(a, Anchor::Listing { .. })));
    }

    #[test]
    fn test_restartable() {
        let first: Vec<_> = anchors(PAGE).collect();
        let second: Vec<_> = anchors(PAGE).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_malformed_zone_links_are_skipped() {
        let page = concat!(
            "<a href=\"https://www.wowhead.com/zone=notdigits/x\">Bad</a>",
            "<a href=\"https://www.wowhead.com/zone=7558/ok\">Val'sharah</a>",
        );
        let zones: Vec<_> = anchors(page)
            .filter_map(|a| match a {
                Anchor::Zone { id, name } => Some((id, name)),
                _ => None,
            })
            .collect();
        assert_eq!(zones, vec![(7558, "Val'sharah")]);
    }

    #[test]
    fn test_unbalanced_record_tail_ends_scan() {
        let page = "_[1]{a:1}; _[2]{b:{truncated";
        let records: Vec<_> = anchors(page)
            .filter_map(|a| match a {
                Anchor::Record { id, .. } => Some(id),
                _ => None,
            })
            .collect();
        assert_eq!(records, vec![1]);
    }

    #[test]
    fn test_empty_page_terminates() {
        assert_eq!(anchors("").count(), 0);
        assert_eq!(anchors("no anchors here at all").count(), 0);
    }
}
