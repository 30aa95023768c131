//! `aggregate(aggregator [, init])`: a fold with `$this`, `$index`, and
//! `$total` bound per iteration.

use crate::ast::Expression;
use crate::context::Context;
use crate::error::Result;
use crate::eval;
use crate::value::Collection;

pub(crate) fn aggregate(
    input: &Collection,
    args: &[Expression],
    ctx: &Context,
) -> Result<Collection> {
    let mut total = match args.get(1) {
        Some(init) => eval::evaluate_expression(init, input, ctx)?,
        None => Collection::empty(),
    };
    for (index, item) in input.iter().enumerate() {
        let scope = ctx.with_iteration(item.clone(), index).with_total(total);
        let focus = Collection::singleton(item.clone());
        total = eval::evaluate_expression(&args[0], &focus, &scope)?;
    }
    Ok(total)
}
