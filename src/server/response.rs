use crate::dispatcher::{Body, Response as DispatchResponse};
use crate::status;
use dashmap::DashMap;
use may_minihttp::Response;
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{error, warn};

/// Distinct header lines kept for the process lifetime.
pub const MAX_INTERNED_HEADER_LINES: usize = 65_536;

/// Response headers the adapter does not put on the wire; they change with
/// every request.
const PER_REQUEST_HEADERS: [&str; 1] = ["x-request-id"];

/// Headers whose values are rarely repeated; they are leaked per response
/// instead of filling the interned table.
const VOLATILE_HEADERS: [&str; 2] = ["set-cookie", "location"];

/// Total bytes of volatile header lines leaked for the process lifetime.
pub const MAX_LEAKED_HEADER_BYTES: usize = 16 * 1024 * 1024;

static LEAKED_BYTES: AtomicUsize = AtomicUsize::new(0);

/// A `'static` copy of `line` charged to `budget`.
///
/// `None` when the line would take `budget` past `cap`.
pub fn leak_header_line(line: String, budget: &AtomicUsize, cap: usize) -> Option<&'static str> {
    let len = line.len();
    budget
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
            used.checked_add(len).filter(|total| *total <= cap)
        })
        .ok()?;
    Some(Box::leak(line.into_boxed_str()))
}

// may_minihttp takes header lines as `&'static str`.
static HEADER_LINES: Lazy<DashMap<String, &'static str>> = Lazy::new(DashMap::new);

/// A `'static` copy of `line`, shared by every response that sends it.
///
/// `None` once [`MAX_INTERNED_HEADER_LINES`] distinct lines are held.
pub fn intern_header_line(line: String) -> Option<&'static str> {
    if let Some(interned) = HEADER_LINES.get(&line) {
        return Some(*interned);
    }
    if HEADER_LINES.len() >= MAX_INTERNED_HEADER_LINES {
        return None;
    }
    let interned = *HEADER_LINES
        .entry(line.clone())
        .or_insert_with(|| Box::leak(line.into_boxed_str()));
    Some(interned)
}

/// Write a dispatch response: status line, headers, body.
pub fn write_response(res: &mut Response, response: &DispatchResponse) {
    let code = u32::from(response.status);
    let reason = status::reason(code).unwrap_or("Unknown");
    res.status_code(response.status as usize, reason);

    for (name, value) in &response.headers {
        if PER_REQUEST_HEADERS
            .iter()
            .any(|skip| name.eq_ignore_ascii_case(skip))
        {
            continue;
        }
        let line = format!("{name}: {value}");
        if VOLATILE_HEADERS
            .iter()
            .any(|volatile| name.eq_ignore_ascii_case(volatile))
        {
            match leak_header_line(line, &LEAKED_BYTES, MAX_LEAKED_HEADER_BYTES) {
                Some(line) => {
                    res.header(line);
                }
                None => warn!(header = %name, "Volatile header budget spent; header dropped"),
            }
            continue;
        }
        match intern_header_line(line) {
            Some(line) => {
                res.header(line);
            }
            None => warn!(header = %name, "Header line table full; header dropped"),
        }
    }

    let mut bytes = Vec::new();
    match &response.body {
        Body::Empty => {}
        body => {
            if let Err(err) = body.write_to(&mut bytes) {
                error!(error = %err, "Response body could not be produced");
                res.status_code(500, "Internal Server Error");
                bytes.clear();
            }
        }
    }
    res.body_vec(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interned_lines_are_shared() {
        let a = intern_header_line("X-Test-Interned: 1".to_owned()).unwrap();
        let b = intern_header_line("X-Test-Interned: 1".to_owned()).unwrap();
        assert!(std::ptr::eq(a, b));
        assert_eq!(a, "X-Test-Interned: 1");
    }

    #[test]
    fn test_leaked_lines_stop_at_the_cap() {
        let budget = AtomicUsize::new(0);
        let line = "Set-Cookie: zest=01ARZ3NDEKTSV4RRFFQ69G5FAV".to_owned();
        let cap = line.len() * 2;

        assert!(leak_header_line(line.clone(), &budget, cap).is_some());
        assert!(leak_header_line(line.clone(), &budget, cap).is_some());
        assert!(leak_header_line(line, &budget, cap).is_none());
        assert_eq!(budget.load(Ordering::Acquire), cap);
        assert!(leak_header_line(String::new(), &budget, cap).is_some());
    }
}
