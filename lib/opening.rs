/// Contiguous ranges of [ECO] codes and the name of the opening they classify.
///
/// [ECO]: https://www.chessprogramming.org/ECO
const OPENINGS: [(&str, &str, &str); 64] = [
    ("A00", "A00", "Uncommon Opening"),
    ("A01", "A01", "Nimzowitsch-Larsen Attack"),
    ("A02", "A03", "Bird's Opening"),
    ("A04", "A06", "Reti Opening"),
    ("A07", "A08", "King's Indian Attack"),
    ("A09", "A09", "Reti Opening"),
    ("A10", "A10", "English Opening"),
    ("A11", "A11", "English Opening, Caro-Kann Defensive System"),
    ("A12", "A13", "English Opening"),
    ("A14", "A14", "English Opening, Neo-Catalan"),
    ("A15", "A17", "English Opening"),
    ("A18", "A19", "English Opening, Mikenas-Carls"),
    ("A20", "A39", "English Opening"),
    ("A40", "A41", "Queen's Pawn Game"),
    ("A42", "A42", "Modern Defense"),
    ("A43", "A44", "Old Benoni Defense"),
    ("A45", "A45", "Indian Game"),
    ("A46", "A46", "Queen's Pawn Game"),
    ("A47", "A47", "Queen's Indian Defense"),
    ("A48", "A49", "King's Indian"),
    ("A50", "A50", "Queen's Pawn Game"),
    ("A51", "A52", "Budapest Gambit"),
    ("A53", "A55", "Old Indian Defense"),
    ("A56", "A56", "Benoni Defense"),
    ("A57", "A59", "Benko Gambit"),
    ("A60", "A79", "Benoni Defense"),
    ("A80", "A99", "Dutch Defense"),
    ("B00", "B00", "King's Pawn Opening"),
    ("B01", "B01", "Scandinavian Defense"),
    ("B02", "B05", "Alekhine's Defense"),
    ("B06", "B06", "Modern Defense"),
    ("B07", "B09", "Pirc Defense"),
    ("B10", "B19", "Caro-Kann Defense"),
    ("B20", "B99", "Sicilian Defense"),
    ("C00", "C19", "French Defense"),
    ("C20", "C20", "King's Pawn Game"),
    ("C21", "C21", "Danish Gambit"),
    ("C22", "C22", "Center Game"),
    ("C23", "C24", "Bishop's Opening"),
    ("C25", "C29", "Vienna Game"),
    ("C30", "C39", "King's Gambit"),
    ("C40", "C40", "King's Knight Opening"),
    ("C41", "C41", "Philidor Defense"),
    ("C42", "C43", "Petrov's Defense"),
    ("C44", "C44", "King's Pawn Game"),
    ("C45", "C45", "Scotch Game"),
    ("C46", "C46", "Three Knights Game"),
    ("C47", "C49", "Four Knights Game"),
    ("C50", "C54", "Italian Game"),
    ("C55", "C59", "Two Knights Defense"),
    ("C60", "C99", "Ruy Lopez"),
    ("D00", "D00", "Queen's Pawn Game"),
    ("D01", "D01", "Veresov Opening"),
    ("D02", "D02", "Queen's Pawn Game"),
    ("D03", "D03", "Torre Attack"),
    ("D04", "D05", "Queen's Pawn Game"),
    ("D06", "D69", "Queen's Gambit"),
    ("D70", "D79", "Neo-Grunfeld Defense"),
    ("D80", "D99", "Grunfeld Defense"),
    ("E00", "E00", "Queen's Pawn Game"),
    ("E01", "E09", "Catalan Opening"),
    ("E10", "E19", "Queen's Indian Defense"),
    ("E20", "E59", "Nimzo-Indian Defense"),
    ("E60", "E99", "King's Indian Defense"),
];

/// The name of the opening classified by an [ECO] code, or `"Unknown"`.
///
/// [ECO]: https://www.chessprogramming.org/ECO
pub fn opening_name(code: &str) -> &'static str {
    let code = code.trim();

    let well_formed = matches!(code.as_bytes(), [b'A'..=b'E', b'0'..=b'9', b'0'..=b'9']);

    if !well_formed {
        return "Unknown";
    }

    OPENINGS
        .iter()
        .find(|(first, last, _)| (*first..=*last).contains(&code))
        .map_or("Unknown", |(_, _, name)| *name)
}
