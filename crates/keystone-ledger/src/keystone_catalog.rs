//! Static dungeon catalog and alias lookup.
//!
//! Aliases are matched case-insensitively against the start of a keystone
//! text. The lookup walks an index ordered by descending alias length, so the
//! longest alias that ends on a word boundary always wins regardless of the
//! order dungeons are declared in.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "UPPERCASE")]
/// Enumerates the dungeons a keystone can be set for.
pub enum ActivityId {
    Brh,
    Cos,
    Dht,
    Eoa,
    Hov,
    Mos,
    Nl,
    Arc,
    Vow,
    Lkara,
    Ukara,
    Coen,
    Seat,
    Ad,
    Fh,
    Kr,
    Sots,
    Sob,
    Tos,
    Tm,
    Ur,
    Td,
    Wm,
    Omj,
    Omw,
    Dos,
    Mots,
    Hoa,
    Sd,
    Pf,
    Soa,
    Tnw,
    Top,
    Tsw,
    Tsg,
    Grd,
    Id,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Display name and lower-case aliases for one dungeon.
pub struct Activity {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
}

impl ActivityId {
    pub const ALL: [ActivityId; 37] = [
        Self::Brh,
        Self::Cos,
        Self::Dht,
        Self::Eoa,
        Self::Hov,
        Self::Mos,
        Self::Nl,
        Self::Arc,
        Self::Vow,
        Self::Lkara,
        Self::Ukara,
        Self::Coen,
        Self::Seat,
        Self::Ad,
        Self::Fh,
        Self::Kr,
        Self::Sots,
        Self::Sob,
        Self::Tos,
        Self::Tm,
        Self::Ur,
        Self::Td,
        Self::Wm,
        Self::Omj,
        Self::Omw,
        Self::Dos,
        Self::Mots,
        Self::Hoa,
        Self::Sd,
        Self::Pf,
        Self::Soa,
        Self::Tnw,
        Self::Top,
        Self::Tsw,
        Self::Tsg,
        Self::Grd,
        Self::Id,
    ];

    pub fn activity(self) -> &'static Activity {
        match self {
            Self::Brh => &Activity {
                name: "Black Rook Hold",
                aliases: &["black rook hold", "brh", "black rook", "hold"],
            },
            Self::Cos => &Activity {
                name: "Court of Stars",
                aliases: &["court of stars", "cos", "court"],
            },
            Self::Dht => &Activity {
                name: "Darkheart Thicket",
                aliases: &["darkheart thicket", "dht", "thicket", "darkheart"],
            },
            Self::Eoa => &Activity {
                name: "Eye of Azshara",
                aliases: &["eye of azshara", "eoa", "eye", "azshara"],
            },
            Self::Hov => &Activity {
                name: "Halls of Valor",
                aliases: &["halls of valor", "hall of valor", "hov"],
            },
            Self::Mos => &Activity {
                name: "Maw of Souls",
                aliases: &["maw of souls", "mos", "maw"],
            },
            Self::Nl => &Activity {
                name: "Neltharion's Lair",
                aliases: &[
                    "neltharion's lair",
                    "nl",
                    "neltharions lair",
                    "nel",
                    "nelth",
                    "lair",
                ],
            },
            Self::Arc => &Activity {
                name: "The Arcway",
                aliases: &["the arcway", "arc", "arcway"],
            },
            Self::Vow => &Activity {
                name: "Vault of the Wardens",
                aliases: &["vault of the wardens", "vow", "vault", "warden", "wardens"],
            },
            Self::Lkara => &Activity {
                name: "Lower Karazhan",
                aliases: &["lower karazhan", "lower kara", "lk", "lkara", "lower"],
            },
            Self::Ukara => &Activity {
                name: "Upper Karazhan",
                aliases: &["upper karazhan", "upper kara", "uk", "ukara", "upper"],
            },
            Self::Coen => &Activity {
                name: "Cathedral of Eternal Night",
                aliases: &[
                    "cathedral of eternal night",
                    "coen",
                    "cen",
                    "cathedral",
                    "cathedral of night",
                    "cathedral eternal night",
                    "eternal night",
                ],
            },
            Self::Seat => &Activity {
                name: "Seat of the Triumvirate",
                aliases: &[
                    "seat of the triumvirate",
                    "seat",
                    "sott",
                    "triumvirate",
                    "seat of triumvirate",
                    "seat the triumvirate",
                ],
            },
            Self::Ad => &Activity {
                name: "Atal'Dazar",
                aliases: &["ad", "atal", "atal'dazar", "ataldazar"],
            },
            Self::Fh => &Activity {
                name: "Freehold",
                aliases: &["fh", "freehold"],
            },
            Self::Kr => &Activity {
                name: "King's Rest",
                aliases: &["kr", "kings", "kings rest", "king's rest"],
            },
            Self::Sots => &Activity {
                name: "Shrine of the Storm",
                aliases: &["shrine", "sots", "shrine of the storm"],
            },
            Self::Sob => &Activity {
                name: "Siege of Boralus",
                aliases: &["sob", "siege", "boralus", "siege of boralus"],
            },
            Self::Tos => &Activity {
                name: "Temple of Sethraliss",
                aliases: &["tos", "temple", "temple of sethraliss", "sethraliss"],
            },
            Self::Tm => &Activity {
                name: "The MOTHERLODE!!",
                aliases: &["tm", "motherlode", "mother", "the motherlode", "ml"],
            },
            Self::Ur => &Activity {
                name: "The Underrot",
                aliases: &["ur", "underrot", "the underrot"],
            },
            Self::Td => &Activity {
                name: "Tol Dagor",
                aliases: &["td", "tol", "dagor", "tol dagor"],
            },
            Self::Wm => &Activity {
                name: "Waycrest Manor",
                aliases: &["wm", "waycrest", "manor", "waycrest manor"],
            },
            Self::Omj => &Activity {
                name: "Operation: Mechagon - Junkyard",
                aliases: &[
                    "omj",
                    "operation junkyard",
                    "mechagon junkyard",
                    "lower mecha",
                    "junk",
                    "yard",
                    "junkyard",
                ],
            },
            Self::Omw => &Activity {
                name: "Operation: Mechagon - Workshop",
                aliases: &[
                    "omw",
                    "operation workshop",
                    "mechagon workshop",
                    "upper mecha",
                    "work",
                    "workshop",
                ],
            },
            Self::Dos => &Activity {
                name: "De Other Side",
                aliases: &["dos", "de other side", "the other side", "other side"],
            },
            Self::Mots => &Activity {
                name: "Mists of Tirna Scithe",
                aliases: &[
                    "mots",
                    "mts",
                    "mists",
                    "mists of tirna scithe",
                    "tirna",
                    "scithe",
                    "tirna scithe",
                ],
            },
            Self::Hoa => &Activity {
                name: "Halls of Atonement",
                aliases: &["hoa", "halls", "halls of atonement", "atonement"],
            },
            Self::Sd => &Activity {
                name: "Sanguine Depths",
                aliases: &["sd", "sanguine depths"],
            },
            Self::Pf => &Activity {
                name: "Plaguefall",
                aliases: &["pf", "plaguefall", "plague"],
            },
            Self::Soa => &Activity {
                name: "Spires of Ascension",
                aliases: &["soa", "spires", "ascension", "spires of ascension"],
            },
            Self::Tnw => &Activity {
                name: "The Necrotic Wake",
                aliases: &["tnw", "nw", "necrotic wake", "the necrotic wake"],
            },
            Self::Top => &Activity {
                name: "Theatre of Pain",
                aliases: &[
                    "top",
                    "theatre",
                    "theater",
                    "theatre of pain",
                    "theater of pain",
                ],
            },
            Self::Tsw => &Activity {
                name: "Tazavesh: Streets of Wonder",
                aliases: &["tsw", "tsow", "streets of wonder", "streets"],
            },
            Self::Tsg => &Activity {
                name: "Tazavesh: Solheah's Gambit",
                aliases: &["tsg", "soleah", "solheah's gambit", "gambit"],
            },
            Self::Grd => &Activity {
                name: "Grimrail Depot",
                aliases: &["gd", "grimrail depot", "grimrail", "depot", "train"],
            },
            Self::Id => &Activity {
                name: "Iron Docks",
                aliases: &["id", "iron docks", "docks", "boat"],
            },
        }
    }

    pub fn name(self) -> &'static str {
        self.activity().name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Result of matching a dungeon alias at the start of a keystone text.
pub struct ActivityAliasMatch {
    pub activity: ActivityId,
    /// Byte length of the matched alias in the lower-cased input.
    pub alias_len: usize,
}

#[derive(Debug, Clone, Copy)]
struct ActivityAliasEntry {
    alias: &'static str,
    activity: ActivityId,
}

fn activity_alias_index() -> &'static [ActivityAliasEntry] {
    static INDEX: OnceLock<Vec<ActivityAliasEntry>> = OnceLock::new();
    INDEX.get_or_init(|| {
        let mut entries = ActivityId::ALL
            .iter()
            .flat_map(|activity| {
                activity
                    .activity()
                    .aliases
                    .iter()
                    .map(move |alias| ActivityAliasEntry {
                        alias: *alias,
                        activity: *activity,
                    })
            })
            .collect::<Vec<_>>();
        entries.sort_by(|left, right| {
            right
                .alias
                .len()
                .cmp(&left.alias.len())
                .then_with(|| left.alias.cmp(right.alias))
        });
        entries
    })
}

/// Finds the longest alias that starts `text` and is followed by a space or
/// the end of the string.
pub fn find_activity_by_alias(text: &str) -> Option<ActivityAliasMatch> {
    let lowered = text.to_lowercase();
    activity_alias_index().iter().find_map(|entry| {
        let rest = lowered.strip_prefix(entry.alias)?;
        if rest.is_empty() || rest.starts_with(' ') {
            Some(ActivityAliasMatch {
                activity: entry.activity,
                alias_len: entry.alias.len(),
            })
        } else {
            None
        }
    })
}
