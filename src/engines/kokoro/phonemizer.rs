use std::borrow::Cow;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::model::KokoroError;
use super::vocab::Vocab;

/// Location of the espeak-ng binary and its data directory.
///
/// Both default to the system installation (`espeak-ng` on PATH).
#[derive(Debug, Clone, Default)]
pub struct EspeakConfig {
    pub bin_path: Option<PathBuf>,
    pub data_path: Option<PathBuf>,
}

impl EspeakConfig {
    fn command(&self) -> Command {
        let bin = self.bin_path.as_deref().unwrap_or(Path::new("espeak-ng"));
        let mut cmd = Command::new(bin);
        if let Some(data) = &self.data_path {
            cmd.env("ESPEAK_DATA_PATH", data);
        }
        cmd
    }
}

/// A word or punctuation mark from the input text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextPart {
    pub text: String,
    pub is_punct: bool,
    /// Whether whitespace separated this part from the previous one.
    pub space_before: bool,
}

/// A [`TextPart`] with its phoneme token IDs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhonemizedPart {
    pub part: TextPart,
    pub ids: Vec<i64>,
}

/// Split text into sentences, keeping terminal punctuation with its sentence.
///
/// Decimal points and thousands separators between digits do not end a
/// sentence. Line breaks always do.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if ch == '\n' || ch == '\r' {
            flush_sentence(&mut sentences, &mut current);
            continue;
        }

        current.push(ch);
        if !is_terminal(ch) || is_numeric_connector_between_digits(text, idx, ch.len_utf8(), ch) {
            continue;
        }

        // Closing quotes and brackets stay with the sentence they close.
        while let Some(&(_, next)) = chars.peek() {
            if !matches!(next, '"' | ')' | '\u{201d}') {
                break;
            }
            current.push(next);
            chars.next();
        }

        if chars.peek().map_or(true, |&(_, next)| next.is_whitespace()) {
            flush_sentence(&mut sentences, &mut current);
        }
    }

    flush_sentence(&mut sentences, &mut current);
    sentences
}

fn is_terminal(ch: char) -> bool {
    matches!(ch, '.' | '!' | '?' | ';' | ':' | '…')
}

fn flush_sentence(sentences: &mut Vec<String>, current: &mut String) {
    let trimmed = current.split_whitespace().collect::<Vec<_>>().join(" ");
    if !trimmed.is_empty() {
        sentences.push(trimmed);
    }
    current.clear();
}

/// Split text into words and punctuation marks.
pub fn split_words(text: &str) -> Vec<TextPart> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut space_before = false;

    for (idx, ch) in text.char_indices() {
        if ch.is_whitespace() {
            flush_word(&mut parts, &mut current, &mut space_before);
            space_before = true;
            continue;
        }

        if is_boundary_punctuation(ch) && !is_numeric_connector_between_digits(text, idx, ch.len_utf8(), ch) {
            flush_word(&mut parts, &mut current, &mut space_before);
            parts.push(TextPart {
                text: ch.to_string(),
                is_punct: true,
                space_before: space_before && !parts.is_empty(),
            });
            space_before = false;
            continue;
        }

        current.push(ch);
    }

    flush_word(&mut parts, &mut current, &mut space_before);
    parts
}

fn flush_word(parts: &mut Vec<TextPart>, current: &mut String, space_before: &mut bool) {
    if current.is_empty() {
        return;
    }
    parts.push(TextPart {
        text: std::mem::take(current),
        is_punct: false,
        space_before: *space_before && !parts.is_empty(),
    });
    *space_before = false;
}

fn is_boundary_punctuation(ch: char) -> bool {
    matches!(
        ch,
        '.' | '!' | '?' | ',' | ';' | ':' | '—' | '…' | '"' | '(' | ')' | '\u{201c}' | '\u{201d}'
    )
}

fn is_numeric_connector_between_digits(text: &str, idx: usize, ch_len: usize, ch: char) -> bool {
    if !matches!(ch, '.' | ',') {
        return false;
    }

    let prev = text[..idx].chars().next_back();
    let next = text[idx + ch_len..].chars().next();

    matches!(
        (prev, next),
        (Some(left), Some(right)) if left.is_ascii_digit() && right.is_ascii_digit()
    )
}

/// Reassemble the text of a run of parts.
pub fn join_parts<'a>(parts: impl IntoIterator<Item = &'a TextPart>) -> String {
    let mut text = String::new();
    for part in parts {
        if part.space_before && !text.is_empty() {
            text.push(' ');
        }
        text.push_str(&part.text);
    }
    text
}

/// Phonemize each word separately so that every phoneme can be traced back to
/// the word it came from.
///
/// All words go to espeak-ng in one invocation, one per line. Punctuation maps
/// straight to its vocab ID.
pub fn phonemize_parts(
    parts: Vec<TextPart>,
    lang: &str,
    vocab: &Vocab,
    espeak: &EspeakConfig,
) -> Result<Vec<PhonemizedPart>, KokoroError> {
    let words: Vec<&str> = parts
        .iter()
        .filter(|p| !p.is_punct)
        .map(|p| p.text.as_str())
        .collect();
    let mut word_ids = if words.is_empty() {
        Vec::new()
    } else {
        phonemize_lines(&words, lang, vocab, espeak)?
    }
    .into_iter();

    Ok(parts
        .into_iter()
        .map(|part| {
            let ids = if part.is_punct {
                part.text
                    .chars()
                    .next()
                    .and_then(|c| vocab.get(c))
                    .into_iter()
                    .collect()
            } else {
                word_ids.next().unwrap_or_default()
            };
            PhonemizedPart { part, ids }
        })
        .collect())
}

/// Convert a whole segment of text to Kokoro phoneme token IDs.
///
/// Words between two punctuation marks are phonemized together so they keep
/// their cross-word phonology. Characters not in the vocab are dropped.
pub fn phonemize(
    text: &str,
    lang: &str,
    vocab: &Vocab,
    espeak: &EspeakConfig,
) -> Result<Vec<i64>, KokoroError> {
    let mut runs: Vec<TextPart> = Vec::new();
    for part in split_words(text) {
        match runs.last_mut() {
            Some(run) if !run.is_punct && !part.is_punct => {
                run.text.push(' ');
                run.text.push_str(&part.text);
            }
            _ => runs.push(part),
        }
    }

    let mut ids = Vec::new();
    for run in phonemize_parts(runs, lang, vocab, espeak)? {
        if run.part.space_before && !ids.is_empty() {
            ids.extend(vocab.space_id());
        }
        ids.extend(run.ids);
    }
    Ok(ids)
}

fn phonemize_lines(
    lines: &[&str],
    lang: &str,
    vocab: &Vocab,
    espeak: &EspeakConfig,
) -> Result<Vec<Vec<i64>>, KokoroError> {
    let output = run_espeak(&lines.join("\n"), lang, espeak)?;
    let out_lines: Vec<&str> = output.lines().filter(|l| !l.trim().is_empty()).collect();

    // espeak-ng should emit one line per input line in stdin mode. If that
    // assumption breaks, fall back to one invocation per line.
    if out_lines.len() != lines.len() {
        log::debug!(
            "espeak-ng returned {} lines for {} inputs, phonemizing one by one",
            out_lines.len(),
            lines.len()
        );
        return lines
            .iter()
            .map(|line| Ok(ipa_to_ids(&run_espeak(line, lang, espeak)?, vocab)))
            .collect();
    }

    Ok(out_lines.iter().map(|line| ipa_to_ids(line, vocab)).collect())
}

fn run_espeak(input: &str, lang: &str, espeak: &EspeakConfig) -> Result<String, KokoroError> {
    let mut child = espeak
        .command()
        .args(["--ipa", "--stdin", "-q", "-v", lang])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                KokoroError::EspeakNotFound
            } else {
                KokoroError::Io(e)
            }
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        // Without a final line terminator espeak-ng can under-process the
        // last token.
        stdin.write_all(newline_terminated(input).as_bytes())?;
    }

    let output = child.wait_with_output()?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(KokoroError::PhonemizerFailed(format!(
            "espeak-ng exited with code {:?}: {stderr}",
            output.status.code()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn newline_terminated(input: &str) -> Cow<'_, str> {
    if input.ends_with('\n') {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(format!("{input}\n"))
    }
}

fn ipa_to_ids(ipa: &str, vocab: &Vocab) -> Vec<i64> {
    ipa.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .flat_map(str::chars)
        .filter(|&ch| ch != '_')
        .filter_map(|ch| vocab.get(ch))
        .collect()
}
