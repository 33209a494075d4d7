//! Reconstructs the platform's `x-client-transaction-id` header.
//!
//! The algorithm is reverse-engineered from the platform's own web bundle
//! and must be reproduced bit-exact or signed requests come back 404. It is
//! pure computation over two captured artifacts (home page HTML, a small
//! runtime script).
//!
//! Grounded on `original_source/src/client/x_transaction.py` for exact
//! numeric semantics, re-shaped as a Rust struct following
//! `other_examples/…amaanq-xitter-txid__src-transaction.rs.rs`'s
//! `ClientTransaction` (constructor from raw HTML + JS strings, a
//! `generate_transaction_id(method, path)` method) — using `sha2` and the
//! `base64` engine API rather than that file's `hmac_sha256`/hand-rolled
//! base64, to match this crate's own dependency choices.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::error::TxidError;

const RANDOM_KEYWORD: &str = "obfiowerehiring";
const ADDITIONAL_RANDOM_NUMBER: u8 = 3;
const ONDEMAND_BASE_URL: &str = "https://abs.twimg.com/responsive-web/client-web";
/// X's custom epoch: 2023-05-01 00:00:00 UTC. Opaque platform constant.
const X_EPOCH_SECONDS: u64 = 1_682_924_400;

static ONDEMAND_FILE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"['"]ondemand\.s['"]:\s*['"]([\w]*)['"]"#).expect("valid ondemand regex")
});

static INDICES_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(\w\[(\d{1,2})\],\s*16\)").expect("valid indices regex"));

/// Derived, per-session material needed to stamp every request. Built
/// lazily on first signed request; invalidated (rebuilt) on HTTP 404.
pub struct ClientTransaction {
    key_bytes: Vec<u8>,
    animation_key: String,
}

impl ClientTransaction {
    /// Builds the context from the home page HTML and the `ondemand.s.*.js`
    /// script text it references.
    pub fn new(home_page_html: &str, ondemand_script: &str) -> Result<Self, TxidError> {
        let (row_index, key_byte_indices) = extract_indices(ondemand_script)?;
        let key = extract_site_verification_key(home_page_html)?;
        let key_bytes = STANDARD.decode(key.trim())?;
        let animation_key =
            build_animation_key(&key_bytes, home_page_html, row_index, &key_byte_indices)?;
        Ok(Self {
            key_bytes,
            animation_key,
        })
    }

    /// Extracts the `ondemand.s.*.js` URL referenced by the home page.
    pub fn extract_ondemand_url(home_page_html: &str) -> Result<String, TxidError> {
        let filename = ONDEMAND_FILE_REGEX
            .captures(home_page_html)
            .and_then(|caps| caps.get(1))
            .ok_or(TxidError::MissingKey("ondemand.s filename"))?
            .as_str();
        Ok(format!("{ONDEMAND_BASE_URL}/ondemand.s.{filename}a.js"))
    }

    /// Generates the per-request transaction id for `(method, path)`.
    ///
    /// `time_override` and `random_byte_override` make the function pure
    /// and deterministic for tests; in production both are `None` and the
    /// real clock / a fresh random byte are used.
    pub fn generate_transaction_id(
        &self,
        method: &str,
        path: &str,
        time_override: Option<u32>,
        random_byte_override: Option<u8>,
    ) -> String {
        let time_now = time_override.unwrap_or_else(current_time_offset);
        let hash_input = format!(
            "{method}!{path}!{time_now}{RANDOM_KEYWORD}{}",
            self.animation_key
        );
        let digest = Sha256::digest(hash_input.as_bytes());

        let time_bytes = time_now.to_le_bytes();
        let random_byte = random_byte_override.unwrap_or_else(|| rand::thread_rng().gen_range(0..=255));

        let mut payload = Vec::with_capacity(self.key_bytes.len() + 4 + 16 + 1);
        payload.extend_from_slice(&self.key_bytes);
        payload.extend_from_slice(&time_bytes);
        payload.extend_from_slice(&digest[..16]);
        payload.push(ADDITIONAL_RANDOM_NUMBER);

        let mut obfuscated = Vec::with_capacity(payload.len() + 1);
        obfuscated.push(random_byte);
        obfuscated.extend(payload.iter().map(|byte| byte ^ random_byte));

        STANDARD.encode(obfuscated).trim_end_matches('=').to_owned()
    }
}

fn current_time_offset() -> u32 {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    now.saturating_sub(X_EPOCH_SECONDS) as u32
}

/// Returns `(row_index, key_byte_indices)` parsed from `(x[NN], 16)` matches
/// in the ondemand script. The first match is the row index; the rest are
/// the key-byte indices.
fn extract_indices(ondemand_script: &str) -> Result<(usize, Vec<usize>), TxidError> {
    let candidates: Vec<usize> = INDICES_REGEX
        .captures_iter(ondemand_script)
        .filter_map(|caps| caps.get(1)?.as_str().parse().ok())
        .collect();
    if candidates.is_empty() {
        return Err(TxidError::MissingKey("key byte indices"));
    }
    Ok((candidates[0], candidates[1..].to_vec()))
}

/// Extracts the `twitter-site-verification` meta tag's `content` value.
fn extract_site_verification_key(html: &str) -> Result<String, TxidError> {
    let marker = "name=\"twitter-site-verification\"";
    let marker_pos = html
        .find(marker)
        .ok_or(TxidError::MissingKey("twitter-site-verification meta tag"))?;

    let tag_start = html[..marker_pos].rfind('<').unwrap_or(0);
    let tag_end = html[marker_pos..]
        .find('>')
        .map(|offset| marker_pos + offset)
        .unwrap_or(html.len());
    let tag = &html[tag_start..tag_end];

    let content_marker = "content=\"";
    let content_pos = tag
        .find(content_marker)
        .ok_or(TxidError::MissingKey("content attribute"))?;
    let value_start = content_pos + content_marker.len();
    let value_end = tag[value_start..]
        .find('"')
        .ok_or(TxidError::Malformed("content attribute"))?;

    let value = &tag[value_start..value_start + value_end];
    if value.is_empty() {
        return Err(TxidError::Malformed("twitter-site-verification key is empty"));
    }
    Ok(value.to_owned())
}

/// Returns the raw `d` attribute text of the first curve-bearing `<path>`
/// inside each `[id^="loading-x-anim"]` element, in document order.
fn extract_animation_frames(html: &str) -> Vec<String> {
    let mut frames = Vec::new();
    let mut search_from = 0usize;

    while let Some(rel_pos) = html[search_from..].find("id=\"loading-x-anim") {
        let abs_pos = search_from + rel_pos;
        let svg_end = match html[abs_pos..].find("</svg>") {
            Some(offset) => abs_pos + offset,
            None => break,
        };
        let svg_block = &html[abs_pos..svg_end];

        if let Some(d_value) = first_curve_path_d(svg_block) {
            frames.push(d_value.to_owned());
        }
        search_from = svg_end + "</svg>".len();
    }

    frames
}

fn first_curve_path_d(svg_block: &str) -> Option<&str> {
    let mut search_from = 0usize;
    while let Some(rel_pos) = svg_block[search_from..].find("<path") {
        let path_start = search_from + rel_pos;
        let path_end = svg_block[path_start..]
            .find('>')
            .map(|offset| path_start + offset + 1)?;
        let path_tag = &svg_block[path_start..path_end];

        if let Some(d_value) = extract_d_attribute(path_tag) {
            if d_value.contains('C') {
                return Some(d_value);
            }
        }
        search_from = path_end;
    }
    None
}

fn extract_d_attribute(path_tag: &str) -> Option<&str> {
    let marker = " d=\"";
    let start = path_tag.find(marker)? + marker.len();
    let end = path_tag[start..].find('"')?;
    Some(&path_tag[start..start + end])
}

/// Splits a path's `d` attribute (after the leading `M...` prefix) on `C`
/// into rows of integers.
fn parse_path_rows(path_d: &str) -> Vec<Vec<i64>> {
    let body = if path_d.len() > 9 { &path_d[9..] } else { "" };
    body.split('C')
        .map(|segment| {
            segment
                .chars()
                .map(|c| if c.is_ascii_digit() || c == '-' { c } else { ' ' })
                .collect::<String>()
                .split_whitespace()
                .filter_map(|token| token.parse::<i64>().ok())
                .collect()
        })
        .filter(|row: &Vec<i64>| !row.is_empty())
        .collect()
}

fn build_animation_key(
    key_bytes: &[u8],
    html: &str,
    row_index: usize,
    key_byte_indices: &[usize],
) -> Result<String, TxidError> {
    let row_selector = *key_bytes
        .get(row_index)
        .ok_or(TxidError::Malformed("key too short for row selection"))? as i64;
    let row = (row_selector % 16) as usize;

    let seed: i64 = key_byte_indices
        .iter()
        .filter_map(|&index| key_bytes.get(index))
        .map(|&byte| (byte as i64) % 16)
        .product();
    let frame_time = js_round(seed as f64 / 10.0) * 10.0;

    let frames = extract_animation_frames(html);
    if frames.is_empty() {
        return Err(TxidError::MissingKey("loading-x-anim frames"));
    }
    let frame_selector = *key_bytes
        .get(5)
        .ok_or(TxidError::Malformed("key too short for frame selection"))? as usize;
    let selected_frame = frames
        .get(frame_selector % 4)
        .ok_or(TxidError::Malformed("selected animation frame missing"))?;

    let rows = parse_path_rows(selected_frame);
    let target_row = rows
        .get(row)
        .ok_or(TxidError::Malformed("animation row index out of range"))?;
    if target_row.len() < 11 {
        return Err(TxidError::Malformed("animation row has insufficient data points"));
    }

    let target_time = frame_time / 4096.0;
    animate(target_row, target_time)
}

fn animate(frame: &[i64], target_time: f64) -> Result<String, TxidError> {
    let from_color: Vec<f64> = frame[..3].iter().map(|&v| v as f64).chain([1.0]).collect();
    let to_color: Vec<f64> = frame[3..6].iter().map(|&v| v as f64).chain([1.0]).collect();

    let rotation_target = solve(frame[6] as f64, 60.0, 360.0, true);
    let easing_values: Vec<f64> = frame[7..]
        .iter()
        .enumerate()
        .map(|(index, &value)| solve(value as f64, odd_floor(index), 1.0, false))
        .collect();
    if easing_values.len() < 4 {
        return Err(TxidError::Malformed("animation easing values incomplete"));
    }

    let progress = Cubic::new([
        easing_values[0],
        easing_values[1],
        easing_values[2],
        easing_values[3],
    ])
    .value_at(target_time);

    let color: Vec<f64> = interpolate(&from_color, &to_color, progress)
        .into_iter()
        .map(|v| v.clamp(0.0, 255.0))
        .collect();
    let rotation_degrees = interpolate(&[0.0], &[rotation_target], progress)[0];
    let matrix = rotation_matrix(rotation_degrees);

    let mut parts: Vec<String> = Vec::with_capacity(9);
    for value in &color[..color.len() - 1] {
        parts.push(format!("{:x}", value.round() as i64));
    }
    for value in matrix {
        let rounded = (value * 100.0).round() / 100.0;
        let hex = float_to_hex(rounded.abs());
        if let Some(stripped) = hex.strip_prefix('.') {
            parts.push(format!("0.{}", stripped).to_lowercase());
        } else if hex.is_empty() {
            parts.push("0".to_owned());
        } else {
            parts.push(hex.to_lowercase());
        }
    }
    parts.push("0".to_owned());
    parts.push("0".to_owned());

    let joined: String = parts.join("");
    Ok(joined.chars().filter(|&c| c != '.' && c != '-').collect())
}

/// JavaScript's half-up rounding: `floor(x)` unless the fractional part is
/// `>= 0.5`, in which case `ceil(x)`, preserving sign.
fn js_round(value: f64) -> f64 {
    let floored = value.floor();
    let rounded = if value - floored >= 0.5 { value.ceil() } else { floored };
    rounded.copysign(value)
}

fn solve(value: f64, minimum: f64, maximum: f64, rounding: bool) -> f64 {
    let scaled = value * (maximum - minimum) / 255.0 + minimum;
    if rounding {
        scaled.floor()
    } else {
        (scaled * 100.0).round() / 100.0
    }
}

fn odd_floor(index: usize) -> f64 {
    if index % 2 == 1 {
        -1.0
    } else {
        0.0
    }
}

fn interpolate(start: &[f64], end: &[f64], ratio: f64) -> Vec<f64> {
    start
        .iter()
        .zip(end.iter())
        .map(|(&s, &e)| s * (1.0 - ratio) + e * ratio)
        .collect()
}

fn rotation_matrix(degrees: f64) -> [f64; 4] {
    let radians = degrees.to_radians();
    [radians.cos(), -radians.sin(), radians.sin(), radians.cos()]
}

/// Renders `value`'s integer part as base-16, then (if there is a nonzero
/// fraction) a `.` followed by up to 24 base-16 digits obtained by repeated
/// `frac *= 16; digit = floor(frac); frac -= digit`. Deliberately not a
/// library `%f` formatter, to match the original byte-for-byte.
fn float_to_hex(value: f64) -> String {
    let mut integer_part = value.trunc() as i64;
    let fraction_start = value - (integer_part as f64);

    let mut digits: Vec<char> = Vec::new();
    while integer_part > 0 {
        let digit = integer_part % 16;
        digits.insert(0, hex_digit(digit));
        integer_part /= 16;
    }

    let mut result: String = digits.into_iter().collect();
    let mut fraction = fraction_start;
    if fraction == 0.0 {
        return result;
    }

    result.push('.');
    let mut fraction_digits = 0;
    while fraction > 0.0 && fraction_digits < 24 {
        fraction *= 16.0;
        let digit = fraction.trunc() as i64;
        fraction -= digit as f64;
        result.push(hex_digit(digit));
        fraction_digits += 1;
    }
    result
}

fn hex_digit(value: i64) -> char {
    if value > 9 {
        (b'a' + (value - 10) as u8) as char
    } else {
        (b'0' + value as u8) as char
    }
}

/// Cubic-Bezier solver for the easing curve, resolved by bisection with
/// linear extrapolation outside `[0, 1]`.
struct Cubic {
    curves: [f64; 4],
}

impl Cubic {
    fn new(curves: [f64; 4]) -> Self {
        Self { curves }
    }

    fn value_at(&self, target_time: f64) -> f64 {
        let [c0, c1, c2, c3] = self.curves;

        if target_time <= 0.0 {
            let start_gradient = if c0 > 0.0 {
                c1 / c0
            } else if c1 == 0.0 && c2 > 0.0 {
                c3 / c2
            } else {
                0.0
            };
            return start_gradient * target_time;
        }

        if target_time >= 1.0 {
            let end_gradient = if c2 < 1.0 {
                (c3 - 1.0) / (c2 - 1.0)
            } else if c2 == 1.0 && c0 < 1.0 {
                (c1 - 1.0) / (c0 - 1.0)
            } else {
                0.0
            };
            return 1.0 + end_gradient * (target_time - 1.0);
        }

        let mut start = 0.0_f64;
        let mut end = 1.0_f64;
        let mut middle = 0.0_f64;
        while start < end {
            middle = (start + end) / 2.0;
            let x_estimate = Self::calculate(c0, c2, middle);
            if (target_time - x_estimate).abs() < 0.00001 {
                return Self::calculate(c1, c3, middle);
            }
            if x_estimate < target_time {
                start = middle;
            } else {
                end = middle;
            }
        }
        Self::calculate(c1, c3, middle)
    }

    fn calculate(first: f64, second: f64, middle: f64) -> f64 {
        3.0 * first * (1.0 - middle) * (1.0 - middle) * middle
            + 3.0 * second * (1.0 - middle) * middle * middle
            + middle * middle * middle
    }
}
