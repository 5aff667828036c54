//! Redirection lowering (spec.md section 4.6.3): file redirections must
//! bind their targets before any merge redirections take effect, then the
//! guarded body runs, then targets unbind in reverse order regardless of
//! how the body exits.
//!
//! The lowered shape intentionally keeps redirections as data
//! (`ir::LoweredRedirection`) rather than splicing bind/unbind statements
//! directly into the block, so the evaluator can implement the
//! bind/body/unbind(reverse)/dispose/restore-pipe scaffold as a single
//! primitive instead of the compiler hand-expanding it into goto-laden
//! statement lists.

use crate::ast::stmt::{Redirection, RedirectionStream};

use super::ir::{Lowered, LoweredBlock, LoweredRedirection, LoweredRedirectionKind, LoweredStmt};

/// Order a pipe element's redirection list so every `ToFile` binds before
/// any `Merge` that targets the same or a later stream takes effect (spec.md
/// section 4.6.3: "file redirections must bind before merging
/// redirections"). Stable w.r.t. redirections of the same kind.
pub fn order_bind_before_merge(redirections: &[Redirection]) -> Vec<&Redirection> {
    let mut file_redirections: Vec<&Redirection> = Vec::new();
    let mut merge_redirections: Vec<&Redirection> = Vec::new();
    for redirection in redirections {
        match redirection {
            Redirection::ToFile { .. } => file_redirections.push(redirection),
            Redirection::Merge { .. } => merge_redirections.push(redirection),
        }
    }
    file_redirections.into_iter().chain(merge_redirections).collect()
}

/// Lower one statement's redirection list (already resolved to `Lowered`
/// targets by the caller) into the ordered `LoweredRedirection` list a
/// `LoweredStmt::Redirected` carries, and wrap `body` to produce the final
/// guarded statement. Returns `body` unchanged, unwrapped, when there are no
/// redirections — a redirected wrapper with an empty list would just be
/// pointless ceremony for the evaluator to unwind.
pub fn lower_redirected_body(
    redirections: Vec<(Redirection, Option<Lowered>)>,
    body: LoweredBlock,
) -> LoweredStmt {
    if redirections.is_empty() {
        return LoweredStmt::Block(body);
    }
    let ordered_keys: Vec<&Redirection> = order_bind_before_merge(&redirections.iter().map(|(r, _)| r.clone()).collect::<Vec<_>>());
    let by_identity: Vec<LoweredRedirection> = ordered_keys
        .into_iter()
        .filter_map(|key| {
            redirections.iter().find(|(r, _)| r == key).map(|(r, target)| lower_one(r, target.clone()))
        })
        .collect();
    LoweredStmt::Redirected { redirections: by_identity, body }
}

fn lower_one(redirection: &Redirection, target: Option<Lowered>) -> LoweredRedirection {
    match redirection {
        Redirection::ToFile { from_stream, append, .. } => LoweredRedirection {
            from_stream: from_stream.clone(),
            kind: LoweredRedirectionKind::ToFile {
                append: *append,
                target: target.expect("ToFile redirection must carry a lowered target expression"),
            },
        },
        Redirection::Merge { from_stream, to_stream } => LoweredRedirection {
            from_stream: from_stream.clone(),
            kind: LoweredRedirectionKind::Merge { to_stream: to_stream.clone() },
        },
    }
}

/// `All` expands to every concrete stream other than `Success`, mirroring
/// how a merge or file redirection on `*` fans out (spec.md section
/// 4.6.3). Used by the evaluator's bind step; kept here since it is a pure
/// function of the redirection shape the compiler already owns.
pub fn expand_all_stream(stream: &RedirectionStream) -> Vec<RedirectionStream> {
    if *stream == RedirectionStream::All {
        vec![
            RedirectionStream::Error,
            RedirectionStream::Warning,
            RedirectionStream::Verbose,
            RedirectionStream::Debug,
            RedirectionStream::Information,
        ]
    } else {
        vec![stream.clone()]
    }
}
