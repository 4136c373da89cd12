//! Canned replies: stickers, photos and the odd bit of text.

use crate::telegram::{Media, MediaKind};
use rand::Rng;
use rand::seq::SliceRandom;

const BEER: &str = "\u{1f37a}\u{1f37b}\u{1f37a}";

const ARRL_DOCUMENT: &str = "BQADAQADUgADlek7ChDvVWLw6qmQAg";
const AARP_STICKER: &str = "CAADAQADWxoAAq8ZYgfnwh72WkV5nwI";
const RSGB_DOCUMENT: &str = "BQADAQADZQEAAptvSAb_CoDNeA8cTAI";
const DMR_STICKER: &str = "CAADAQAD7wEAAllaGgIYbpRM1Bw8TwI";
const AWOO_STICKER: &str = "CAADAQADdAEAAptvSAZR8ElrZgRavQI";
const RACES_PHOTO: &str = "AgADAQADqacxG-f_kUQcHb3a_EhrTpyg5y8ABPaeF5Kdq-w1LaEAAgI";

const FCC_PHOTO: &str = "AgADAQAD6K8xG5tvSAYabOrZ1Tw3J9WF5y8ABEuc83jwVjWY1DwAAgI";
const FCC_STICKERS: &[&str] = &[
    "CAADAQADpAEAAptvSAbS5rEK5IeP8AI",
    "CAADAQADagEAAptvSAbfs0d4MEyGbgI",
    "CAADAQADaAEAAptvSAbPHkuRdk8jSAI",
    "CAADAQADdAEAAptvSAZR8ElrZgRavQI",
];

// The last photo is repeated on purpose, it comes up more often.
const WHACKER_PHOTOS: &[&str] = &[
    "AgADAQADqqcxG6wquEUjkFZxfNqArQyR3i8ABD2z_UHyaFH_2DAAAgI",
    "AgADAQADrKcxG6wquEUzmB_8llK9LmON3i8ABDtSuhIsNmYz5zAAAgI",
    "AgADAQADracxG6wquEV2BJayJ0TY9n-c3i8ABPr_E7Ng-UJ47DEAAgI",
    "AgADAQADrqcxG6wquEUnBkzKVE-SehXS5y8ABMxBKSFyc3WlR0MBAAEC",
    "AgADAQADvKcxG4MygUS6ETOqtvL3uHSD3i8ABNSR8ViJFCb5AUgAAgI",
    "AgADAQADr6cxG6wquEVYe0_gM2__hqeA3i8ABEWnbvkhEkqx03gAAgI",
    "AgADAQADr6cxG6wquEVYe0_gM2__hqeA3i8ABEWnbvkhEkqx03gAAgI",
    "AgADAQADr6cxG6wquEVYe0_gM2__hqeA3i8ABEWnbvkhEkqx03gAAgI",
    "AgADAQADr6cxG6wquEVYe0_gM2__hqeA3i8ABEWnbvkhEkqx03gAAgI",
];

const WHACKERKITTY_PHOTOS: &[&str] = &[
    "AgADAQADvqcxGy3eoUSlnk70w6-Gy_mT3i8ABAI-_zIdKdPYOcMAAgI",
    "AgADAQADr6cxG6wquEVYe0_gM2__hqeA3i8ABEWnbvkhEkqx03gAAgI",
];

const QSV_MODES: &[&str] = &["MORSE", "CW", "TEXT", "RTTY", "HELL"];
const QSV_CW: &str = "AwADAQADAgADuQq3EXz85vkZKnreAg";
const QSV_RTTY: &str = "AwADAQADAQADuQq3EfwWa3yAVhOTAg";
const QSV_HELL: &str = "AwADAQADAwADuQq3EafVsjXqN3z5Ag";

pub const CONDITIONS_URL: &str = "http://www.hamqsl.com/solar101vhf.php";
pub const CONDITIONS_ERROR: &str = "Error while fetching band conditions";

pub const COMMANDS: &[&str] = &[
    "beer",
    "freebeer",
    "arrl",
    "aarp",
    "rsgb",
    "dmr",
    "awoo",
    "fcc",
    "races",
    "ares",
    "skywarn",
    "whacker",
    "whackerkitty",
    "qsv",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Canned {
    /// Text, optionally as a reply to the command
    Text { text: String, reply: bool },
    Media { media: Media, reply: bool },
}

impl Canned {
    fn text(text: &str, reply: bool) -> Self {
        Canned::Text {
            text: text.to_string(),
            reply,
        }
    }

    fn media(kind: MediaKind, file: &str) -> Self {
        Canned::Media {
            media: Media::new(kind, file),
            reply: false,
        }
    }
}

pub fn is_media_command(command: &str) -> bool {
    COMMANDS.contains(&command)
}

pub fn for_command(command: &str, args: &str) -> Option<Canned> {
    for_command_with(command, args, &mut rand::thread_rng())
}

pub fn for_command_with<R: Rng>(command: &str, args: &str, rng: &mut R) -> Option<Canned> {
    let canned = match command {
        "beer" | "freebeer" => Canned::text(BEER, false),
        "arrl" => Canned::media(MediaKind::Document, ARRL_DOCUMENT),
        "aarp" => Canned::media(MediaKind::Sticker, AARP_STICKER),
        "rsgb" => Canned::media(MediaKind::Document, RSGB_DOCUMENT),
        "dmr" => Canned::media(MediaKind::Sticker, DMR_STICKER),
        "awoo" => Canned::media(MediaKind::Sticker, AWOO_STICKER),
        "races" | "ares" | "skywarn" => Canned::media(MediaKind::Photo, RACES_PHOTO),
        "fcc" => {
            // One photo among the stickers, each equally likely.
            let pick = rng.gen_range(0..=FCC_STICKERS.len());
            match FCC_STICKERS.get(pick) {
                Some(sticker) => Canned::media(MediaKind::Sticker, sticker),
                None => Canned::media(MediaKind::Photo, FCC_PHOTO),
            }
        }
        "whacker" => Canned::media(MediaKind::Photo, WHACKER_PHOTOS.choose(rng)?),
        "whackerkitty" => Canned::media(MediaKind::Photo, WHACKERKITTY_PHOTOS.choose(rng)?),
        "qsv" => return qsv(args, rng),
        _ => return None,
    };
    Some(canned)
}

fn qsv<R: Rng>(args: &str, rng: &mut R) -> Option<Canned> {
    let mode = match args.split_whitespace().next() {
        Some(mode) => mode.to_uppercase(),
        None => QSV_MODES.choose(rng)?.to_string(),
    };
    let voice = |file: &str| Canned::Media {
        media: Media::new(MediaKind::Voice, file),
        reply: true,
    };
    match mode.as_str() {
        "TEXT" => Some(Canned::text("…VVVVVVVV…", true)),
        "MORSE" => Some(Canned::text("···— ···— ···— ···—", true)),
        "CW" => Some(voice(QSV_CW)),
        "RTTY" => Some(voice(QSV_RTTY)),
        "HELL" => Some(voice(QSV_HELL)),
        _ => None,
    }
}

/// Solar banner URL with a cache-busting query so Telegram refetches it.
pub fn conditions_photo(timestamp: i64) -> Media {
    Media::new(MediaKind::Photo, format!("{}?t={}", CONDITIONS_URL, timestamp))
}
