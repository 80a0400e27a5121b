//! Standard operator library.
//!
//! Every operator here is written against [`EvalApi`](crate::api::EvalApi)
//! only, the same surface custom handlers get.

pub mod boolean;
pub mod compare;
pub mod control;
pub mod function;
pub mod matching;
pub mod reference;
pub mod text;

use std::sync::Arc;

use crate::handler::{Handler, HandlerTable};

use boolean::{And, Not, Or};
use compare::{Compare, CompareOp, Equals, In};
use control::{If, Switch};
use function::Call;
use matching::Match;
use reference::Ref;
use text::Interpolate;

pub(crate) fn register_builtins(table: &mut HandlerTable) {
    let builtins: Vec<(&str, Arc<dyn Handler>)> = vec![
        ("$fn", Arc::new(Call)),
        ("$and", Arc::new(And)),
        ("$or", Arc::new(Or)),
        ("$not", Arc::new(Not)),
        ("$if", Arc::new(If)),
        ("$switch", Arc::new(Switch)),
        ("$eq", Arc::new(Equals)),
        ("$ne", Arc::new(Compare::new(CompareOp::Ne))),
        ("$lt", Arc::new(Compare::new(CompareOp::Lt))),
        ("$lte", Arc::new(Compare::new(CompareOp::Lte))),
        ("$gt", Arc::new(Compare::new(CompareOp::Gt))),
        ("$gte", Arc::new(Compare::new(CompareOp::Gte))),
        ("$regex", Arc::new(Compare::new(CompareOp::Regex))),
        ("$in", Arc::new(In)),
        ("$match", Arc::new(Match)),
        ("$ref", Arc::new(Ref)),
        ("$str", Arc::new(Interpolate)),
    ];
    for (name, handler) in builtins {
        table.insert(name, handler);
    }
}
