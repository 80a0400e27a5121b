use async_trait::async_trait;

use crate::api::EvalApi;
use crate::error::Result;
use crate::handler::Handler;
use crate::node::Data;
use crate::view::View;

/// `$if { condition, then, else }`. The chosen branch is returned unrealized.
pub struct If;

#[async_trait]
impl Handler for If {
    async fn handle(&self, argument: View, api: EvalApi) -> Result<Data> {
        let condition = api.materialize(&argument.get("condition")).await?;
        let branch = if condition.is_truthy() { "then" } else { "else" };
        Ok(Data::View(argument.get(branch)))
    }
}

/// `$switch { cases: [{ condition, value }], default }`.
///
/// Cases are tried cheapest condition first; the first truthy one wins.
pub struct Switch;

#[async_trait]
impl Handler for Switch {
    async fn handle(&self, argument: View, api: EvalApi) -> Result<Data> {
        let cases = api
            .sort_by_cost_with(&argument.get("cases"), |case| case.field("condition"))
            .await?;

        for case in cases {
            if api.materialize(&case.get("condition")).await?.is_truthy() {
                return Ok(Data::View(case.get("value")));
            }
        }
        Ok(Data::View(argument.get("default")))
    }
}
