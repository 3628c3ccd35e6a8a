//! Materialises a document's block tree from the content source.

use std::collections::VecDeque;

use tracing::debug;

use crate::application::sources::{ContentSource, SourceError};
use crate::domain::blocks::Block;

/// Nesting bound for tree fetches; real documents stay far below it.
pub const MAX_TREE_DEPTH: usize = 32;

struct Frame {
    parent: Option<Block>,
    pending: VecDeque<Block>,
    done: Vec<Block>,
}

impl Frame {
    fn new(parent: Option<Block>, children: Vec<Block>) -> Self {
        Self {
            parent,
            done: Vec::with_capacity(children.len()),
            pending: children.into(),
        }
    }
}

/// Fetch the ordered children of `root_id`, attaching nested children
/// depth-first. Any failed fetch aborts the whole tree.
pub async fn build_tree<S>(source: &S, root_id: &str) -> Result<Vec<Block>, SourceError>
where
    S: ContentSource + ?Sized,
{
    let roots = source.fetch_children(root_id).await?;
    let mut stack = vec![Frame::new(None, roots)];
    let mut fetches = 1usize;

    loop {
        let Some(frame) = stack.last_mut() else {
            return Ok(Vec::new());
        };

        match frame.pending.pop_front() {
            Some(block) if block.has_children => {
                if stack.len() >= MAX_TREE_DEPTH {
                    return Err(SourceError::invalid_response(format!(
                        "block tree under `{root_id}` exceeds {MAX_TREE_DEPTH} levels"
                    )));
                }
                let children = source.fetch_children(&block.id).await?;
                fetches += 1;
                stack.push(Frame::new(Some(block), children));
            }
            Some(block) => frame.done.push(block),
            None => {
                let Some(finished) = stack.pop() else {
                    return Ok(Vec::new());
                };
                match (finished.parent, stack.last_mut()) {
                    (Some(mut parent), Some(outer)) => {
                        parent.children = finished.done;
                        outer.done.push(parent);
                    }
                    _ => {
                        debug!(
                            target = "application::render::tree",
                            root = root_id,
                            fetches,
                            "block tree materialised"
                        );
                        return Ok(finished.done);
                    }
                }
            }
        }
    }
}
