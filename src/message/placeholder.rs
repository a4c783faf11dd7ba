use tracing::warn;
use winnow::combinator::{alt, delimited, repeat};
use winnow::error::ModalResult;
use winnow::prelude::*;
use winnow::token::{take_till, take_until};

use crate::{Context, DataSources, Value};

/// A piece of a message template body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Segment<'i> {
    Text(&'i str),
    /// Raw token between `{{` and `}}`, untrimmed.
    Placeholder(&'i str),
}

// -- Grammar ----------------------------------------------------------------

/// `{{` token `}}`, ending at the first `}}` and never spanning lines.
fn placeholder<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    delimited(
        "{{",
        take_until(1.., "}}").verify(|token: &str| !token.contains('\n')),
        "}}",
    )
    .parse_next(input)
}

/// Text up to the next `{`, or a lone `{` that does not open a placeholder.
fn text<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    alt((take_till(1.., '{'), "{")).parse_next(input)
}

fn segment<'i>(input: &mut &'i str) -> ModalResult<Segment<'i>> {
    alt((placeholder.map(Segment::Placeholder), text.map(Segment::Text))).parse_next(input)
}

pub(crate) fn scan(template: &str) -> Vec<Segment<'_>> {
    let mut input = template;
    let parsed: ModalResult<Vec<Segment<'_>>> = repeat(0.., segment).parse_next(&mut input);
    match parsed {
        Ok(mut segments) => {
            if !input.is_empty() {
                segments.push(Segment::Text(input));
            }
            segments
        }
        Err(_) => vec![Segment::Text(template)],
    }
}

// -- Substitution -----------------------------------------------------------

/// Replace every `{{token}}` in `template`.
///
/// Unresolved tokens are written back as `[token]`; substitution itself
/// never fails.
#[must_use]
pub fn substitute(template: &str, ctx: &Context, ds: &DataSources) -> String {
    let mut out = String::with_capacity(template.len());
    for segment in scan(template) {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Placeholder(raw) => {
                let token = raw.trim();
                match lookup(token, ctx, ds) {
                    Some(value) => out.push_str(&value.to_string()),
                    None => {
                        warn!(placeholder = %token, "unresolved placeholder");
                        out.push('[');
                        out.push_str(token);
                        out.push(']');
                    }
                }
            }
        }
    }
    out
}

/// First hit wins:
///
/// 1. `source.rest` inside a known data source, when the value has content;
/// 2. the whole dotted token as a flat context key;
/// 3. the token's last segment as a flat context key;
/// 4. a plain token as a flat context key.
fn lookup<'a>(token: &str, ctx: &'a Context, ds: &'a DataSources) -> Option<&'a Value> {
    if let Some((source, rest)) = token.split_once('.') {
        if let Some(value) = ds.field(source, rest).filter(|v| v.is_truthy()) {
            return Some(value);
        }
        if let Some(value) = present(ctx.get(token)) {
            return Some(value);
        }
        let last = token.rsplit('.').next().unwrap_or(token);
        return present(ctx.get(last));
    }
    present(ctx.get(token))
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}
