//! Complete arithmetic sequences over a column's span

use chrono::{Duration, NaiveDateTime};

use crate::error::{Error, Result};
use crate::model::Value;

/// Step of a [`full_seq`] sequence. `Int` steps int values, `Float` steps
/// numeric values, `Days` and `Seconds` step timestamps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    Int(i64),
    Float(f64),
    Days(i64),
    Seconds(i64),
}

fn int_span(values: &[&Value]) -> Result<(i64, i64)> {
    let mut lo = i64::MAX;
    let mut hi = i64::MIN;
    for v in values {
        match v {
            Value::Int(i) => {
                lo = lo.min(*i);
                hi = hi.max(*i);
            }
            other => return Err(Error::type_mismatch("int values", other.type_name())),
        }
    }
    Ok((lo, hi))
}

fn float_span(values: &[&Value]) -> Result<(f64, f64)> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for v in values {
        match v.as_f64() {
            Some(x) => {
                lo = lo.min(x);
                hi = hi.max(x);
            }
            None => return Err(Error::type_mismatch("numeric values", v.type_name())),
        }
    }
    Ok((lo, hi))
}

fn timestamp_span(values: &[&Value]) -> Result<(NaiveDateTime, NaiveDateTime)> {
    let mut lo: Option<NaiveDateTime> = None;
    let mut hi: Option<NaiveDateTime> = None;
    for v in values {
        match v {
            Value::Timestamp(ts) => {
                lo = Some(lo.map_or(*ts, |cur| cur.min(*ts)));
                hi = Some(hi.map_or(*ts, |cur| cur.max(*ts)));
            }
            other => {
                return Err(Error::type_mismatch("timestamp values", other.type_name()))
            }
        }
    }
    // callers guarantee at least one value
    Ok((lo.unwrap_or_default(), hi.unwrap_or_default()))
}

fn positive(step: i64) -> Result<i64> {
    if step > 0 {
        Ok(step)
    } else {
        Err(Error::type_mismatch("positive step", step.to_string()))
    }
}

/// The complete sequence from the minimum to the maximum of the non-null
/// input, advancing by `step`. The sequence stops at the last point not
/// past the maximum, so an unaligned maximum is simply omitted. Empty or
/// all-null input yields an empty sequence.
pub fn full_seq(values: &[Value], step: Step) -> Result<Vec<Value>> {
    let usable: Vec<&Value> = values.iter().filter(|v| !v.is_null()).collect();
    if usable.is_empty() {
        return Ok(Vec::new());
    }
    match step {
        Step::Int(s) => {
            let s = positive(s)?;
            let (lo, hi) = int_span(&usable)?;
            let mut out = Vec::new();
            let mut v = lo;
            while v <= hi {
                out.push(Value::Int(v));
                match v.checked_add(s) {
                    Some(next) => v = next,
                    None => break,
                }
            }
            Ok(out)
        }
        Step::Float(s) => {
            if !(s > 0.0 && s.is_finite()) {
                return Err(Error::type_mismatch("positive step", s.to_string()));
            }
            let (lo, hi) = float_span(&usable)?;
            let mut out = Vec::new();
            let mut i = 0u64;
            // index-based stepping avoids accumulated drift; the epsilon
            // admits a maximum that is off by float rounding only
            loop {
                let x = lo + i as f64 * s;
                if x > hi + s * 1e-9 {
                    break;
                }
                out.push(Value::Float(x));
                i += 1;
            }
            Ok(out)
        }
        Step::Days(d) => {
            let d = positive(d)?;
            let step = Duration::try_days(d).ok_or_else(|| {
                Error::type_mismatch("representable step", format!("{d} days"))
            })?;
            timestamp_seq(&usable, step)
        }
        Step::Seconds(s) => {
            let s = positive(s)?;
            let step = Duration::try_seconds(s).ok_or_else(|| {
                Error::type_mismatch("representable step", format!("{s} seconds"))
            })?;
            timestamp_seq(&usable, step)
        }
    }
}

fn timestamp_seq(usable: &[&Value], step: Duration) -> Result<Vec<Value>> {
    let (lo, hi) = timestamp_span(usable)?;
    let mut out = Vec::new();
    let mut v = lo;
    while v <= hi {
        out.push(Value::Timestamp(v));
        match v.checked_add_signed(step) {
            Some(next) => v = next,
            None => break,
        }
    }
    Ok(out)
}
