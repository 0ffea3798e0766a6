use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// Accent commands written with a symbol: `\"u`, `\'e`, ...
const SYMBOL_ACCENTS: &[char] = &['"', '\'', '`', '^', '~', '=', '.'];

/// Accent commands written with a letter: `\c c`, `\v{s}`, ...
const LETTER_ACCENTS: &[char] = &['c', 'v', 'u', 'H', 'r', 'k'];

/// Each string holds (base, accented) pairs.
const ACCENTS: &[(char, &str)] = &[
    ('"', "aäAÄeëEËiïIÏoöOÖuüUÜyÿYŸ"),
    ('\'', "aáAÁeéEÉiíIÍoóOÓuúUÚyýYÝcćCĆnńNŃsśSŚzźZŹ"),
    ('`', "aàAÀeèEÈiìIÌoòOÒuùUÙ"),
    ('^', "aâAÂeêEÊiîIÎoôOÔuûUÛ"),
    ('~', "aãAÃnñNÑoõOÕ"),
    ('=', "aāAĀeēEĒiīIĪoōOŌuūUŪ"),
    ('.', "zżZŻeėEĖ"),
    ('c', "cçCÇsşSŞ"),
    ('v', "cčCČsšSŠzžZŽrřRŘeěEĚnňNŇ"),
    ('u', "aăAĂgğGĞ"),
    ('H', "oőOŐuűUŰ"),
    ('r', "aåAÅuůUŮ"),
    ('k', "aąAĄeęEĘ"),
];

const COMMANDS: &[(&str, &str)] = &[
    // Ligatures and special letters
    ("ss", "ß"),
    ("ae", "æ"),
    ("AE", "Æ"),
    ("oe", "œ"),
    ("OE", "Œ"),
    ("aa", "å"),
    ("AA", "Å"),
    ("o", "ø"),
    ("O", "Ø"),
    ("l", "ł"),
    ("L", "Ł"),
    ("i", "ı"),
    ("j", "ȷ"),
    // Symbols
    ("textendash", "–"),
    ("textemdash", "—"),
    ("ldots", "…"),
    ("dots", "…"),
    ("textellipsis", "…"),
    ("copyright", "©"),
    ("textregistered", "®"),
    ("texttrademark", "™"),
    ("S", "§"),
    ("P", "¶"),
    ("pounds", "£"),
    ("euro", "€"),
    ("textasciitilde", "~"),
    ("textbackslash", "\\"),
    ("textbar", "|"),
    ("textless", "<"),
    ("textgreater", ">"),
    ("times", "×"),
    ("pm", "±"),
    ("deg", "°"),
    // Greek letters common in titles
    ("alpha", "α"),
    ("beta", "β"),
    ("gamma", "γ"),
    ("delta", "δ"),
    ("epsilon", "ε"),
    ("lambda", "λ"),
    ("mu", "μ"),
    ("pi", "π"),
    ("sigma", "σ"),
    ("tau", "τ"),
    ("phi", "φ"),
    ("omega", "ω"),
    ("Delta", "Δ"),
    ("Sigma", "Σ"),
    ("Omega", "Ω"),
    // Formatting commands keep their argument only
    ("textbf", ""),
    ("textit", ""),
    ("emph", ""),
    ("textrm", ""),
    ("textsf", ""),
    ("texttt", ""),
    ("textsc", ""),
    ("textup", ""),
    ("textnormal", ""),
    ("mathrm", ""),
    ("mathbf", ""),
    ("mathit", ""),
    ("mathcal", ""),
    ("mbox", ""),
    ("text", ""),
];

/// Characters that are escaped with a backslash and decode to themselves.
const ESCAPED_LITERALS: &[char] = &['&', '%', '$', '#', '_', '{', '}'];

/// Table-driven LaTeX escape decoder.
///
/// Accent commands map `(accent, letter)` to a character and named commands map to a
/// replacement string. Anything not in the tables is copied through unchanged.
#[derive(Debug, Clone)]
pub struct LatexTable {
    accents: FxHashMap<(char, char), char>,
    commands: FxHashMap<String, String>,
}

impl Default for LatexTable {
    fn default() -> Self {
        let mut accents = FxHashMap::default();
        for (accent, pairs) in ACCENTS {
            let chars: Vec<char> = pairs.chars().collect();
            for pair in chars.chunks_exact(2) {
                accents.insert((*accent, pair[0]), pair[1]);
            }
        }
        let commands = COMMANDS
            .iter()
            .map(|(name, rep)| (name.to_string(), rep.to_string()))
            .collect();
        Self { accents, commands }
    }
}

impl LatexTable {
    /// Default table plus `extra` named commands; `extra` wins on conflicts.
    pub fn with_commands(extra: &BTreeMap<String, String>) -> Self {
        let mut table = Self::default();
        for (name, rep) in extra {
            table
                .commands
                .insert(name.trim_start_matches('\\').to_string(), rep.clone());
        }
        table
    }

    /// Decodes escapes and drops grouping braces.
    pub fn decode(&self, input: &str) -> String {
        let chars: Vec<char> = input.chars().collect();
        let mut out = String::with_capacity(input.len());
        let mut i = 0;

        while i < chars.len() {
            match chars[i] {
                '\\' => match self.decode_command(&chars[i..]) {
                    Some((rep, consumed)) => {
                        out.push_str(&rep);
                        i += consumed;
                    }
                    None => {
                        // Unknown command: copy the backslash and its name verbatim.
                        out.push('\\');
                        i += 1;
                        while i < chars.len() && chars[i].is_ascii_alphabetic() {
                            out.push(chars[i]);
                            i += 1;
                        }
                    }
                },
                '{' | '}' | '$' => i += 1,
                '~' => {
                    out.push(' ');
                    i += 1;
                }
                '-' if chars.get(i + 1) == Some(&'-') => {
                    if chars.get(i + 2) == Some(&'-') {
                        out.push('—');
                        i += 3;
                    } else {
                        out.push('–');
                        i += 2;
                    }
                }
                c => {
                    out.push(c);
                    i += 1;
                }
            }
        }

        out
    }

    /// `chars[0]` is the backslash. Returns the replacement and the number of chars
    /// consumed, or `None` if the command is unknown.
    fn decode_command(&self, chars: &[char]) -> Option<(String, usize)> {
        let next = *chars.get(1)?;

        if SYMBOL_ACCENTS.contains(&next) {
            let (base, used) = accent_argument(&chars[2..])?;
            let decoded = self.accents.get(&(next, base))?;
            return Some((decoded.to_string(), 2 + used));
        }

        if ESCAPED_LITERALS.contains(&next) {
            return Some((next.to_string(), 2));
        }

        if next == '\\' {
            return Some((" ".to_string(), 2));
        }

        if !next.is_ascii_alphabetic() {
            return None;
        }

        let name_len = chars[1..]
            .iter()
            .take_while(|c| c.is_ascii_alphabetic())
            .count();
        let name: String = chars[1..1 + name_len].iter().collect();
        let mut end = 1 + name_len;

        if name_len == 1 && LETTER_ACCENTS.contains(&next) {
            let spaces = chars[end..].iter().take_while(|c| **c == ' ').count();
            if let Some((base, used)) = accent_argument(&chars[end + spaces..]) {
                if let Some(decoded) = self.accents.get(&(next, base)) {
                    return Some((decoded.to_string(), end + spaces + used));
                }
            }
        }

        let rep = self.commands.get(&name)?;
        end += chars[end..].iter().take_while(|c| c.is_whitespace()).count();
        if chars.get(end) == Some(&'{') && chars.get(end + 1) == Some(&'}') {
            end += 2;
        }
        Some((rep.clone(), end))
    }
}

/// Parses the letter an accent applies to: `u`, `{u}`, `\i`, or `{\i}`.
fn accent_argument(chars: &[char]) -> Option<(char, usize)> {
    match chars {
        ['{', '\\', c @ ('i' | 'j'), '}', ..] => Some((*c, 4)),
        ['{', c, '}', ..] if c.is_alphabetic() => Some((*c, 3)),
        ['\\', c @ ('i' | 'j'), rest @ ..]
            if !rest.first().is_some_and(|n| n.is_ascii_alphabetic()) =>
        {
            Some((*c, 2))
        }
        [c, ..] if c.is_alphabetic() => Some((*c, 1)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(s: &str) -> String {
        LatexTable::default().decode(s)
    }

    #[test]
    fn umlaut_forms() {
        assert_eq!(decode(r#"M{\"u}ller"#), "Müller");
        assert_eq!(decode(r#"M\"{u}ller"#), "Müller");
        assert_eq!(decode(r#"M\"uller"#), "Müller");
        assert_eq!(decode(r#"{\"O}zt{\"u}rk"#), "Öztürk");
    }

    #[test]
    fn acute_grave_circumflex_tilde() {
        assert_eq!(decode(r"Jos{\'e}"), "José");
        assert_eq!(decode(r"Cr{\`e}me"), "Crème");
        assert_eq!(decode(r"h{\^o}tel"), "hôtel");
        assert_eq!(decode(r"Espa{\~n}a"), "España");
    }

    #[test]
    fn dotless_i() {
        assert_eq!(decode(r"Mart{\'\i}n"), "Martín");
        assert_eq!(decode(r"Mart\'{\i}n"), "Martín");
    }

    #[test]
    fn letter_accents() {
        assert_eq!(decode(r"Fran{\c c}ois"), "François");
        assert_eq!(decode(r"Fran\c{c}ois"), "François");
        assert_eq!(decode(r"\v{S}koda"), "Škoda");
        assert_eq!(decode(r"Erd\H{o}s"), "Erdős");
    }

    #[test]
    fn ligatures_and_specials() {
        assert_eq!(decode(r"Stra{\ss}e"), "Straße");
        assert_eq!(decode(r"Gro\ss e"), "Große");
        assert_eq!(decode(r"{\O}stergaard"), "Østergaard");
        assert_eq!(decode(r"{\L}ukasz"), "Łukasz");
        assert_eq!(decode(r"{\aa}"), "å");
    }

    #[test]
    fn escaped_literals() {
        assert_eq!(decode(r"R\&D"), "R&D");
        assert_eq!(decode(r"50\% faster"), "50% faster");
        assert_eq!(decode(r"a\_b"), "a_b");
        assert_eq!(decode(r"\{x\}"), "{x}");
    }

    #[test]
    fn dashes_and_ties() {
        assert_eq!(decode("100--110"), "100–110");
        assert_eq!(decode("a---b"), "a—b");
        assert_eq!(decode("J.~Smith"), "J. Smith");
    }

    #[test]
    fn grouping_braces_and_math_are_dropped() {
        assert_eq!(decode("{Deep Learning} for {MRI}"), "Deep Learning for MRI");
        assert_eq!(decode(r"$\mu$-Net"), "μ-Net");
    }

    #[test]
    fn formatting_commands_keep_argument() {
        assert_eq!(decode(r"\emph{Nature}"), "Nature");
        assert_eq!(decode(r"\textbf {Bold}"), "Bold");
    }

    #[test]
    fn unknown_commands_left_verbatim() {
        assert_eq!(decode(r"\foo bar"), r"\foo bar");
        assert_eq!(decode(r"\LaTeX"), r"\LaTeX");
        assert_eq!(decode(r#"\"x"#), r#"\"x"#);
    }

    #[test]
    fn trailing_backslash() {
        assert_eq!(decode("abc\\"), "abc\\");
    }

    #[test]
    fn plain_unicode_passes_through() {
        assert_eq!(decode("Müller – Größe"), "Müller – Größe");
    }

    #[test]
    fn extra_commands_extend_table() {
        let mut extra = BTreeMap::new();
        extra.insert("\\textmu".to_string(), "µ".to_string());
        extra.insert("ss".to_string(), "SS".to_string());
        let table = LatexTable::with_commands(&extra);
        assert_eq!(table.decode(r"5\textmu m"), "5µm");
        assert_eq!(table.decode(r"{\ss}"), "SS");
    }
}
