//! NFLOG hook rule management
//!
//! Rules are inserted at the head of each hook chain and removed by
//! scanning the numbered chain listing for the interface. Listing and
//! deleting are separate commands, so callers must not run two
//! invocations against the same chain at once.

use tracing::{debug, info, instrument};

use flowacct_common::shell::{shellquote, IPTABLES_CMD};
use flowacct_common::{CommandRunner, FlowAcctError, FlowAcctResult};

use crate::types::NflogHookSpec;

/// Column of the incoming interface in `iptables -L -v` output
const LISTING_IN_COLUMN: usize = 6;

/// Build rule insertion command
///
/// Inserts the NFLOG rule at position 1 of `chain`
pub fn build_insert_cmd(chain: &str, table: &str, intf: &str, spec: &NflogHookSpec) -> String {
    format!(
        "{} -t {} -I {} 1 -i {} -j NFLOG --nflog-group {} --nflog-range {} --nflog-threshold {}",
        IPTABLES_CMD,
        table,
        chain,
        shellquote(intf),
        spec.group,
        spec.range,
        spec.threshold
    )
}

/// Build numbered chain listing command
pub fn build_list_cmd(chain: &str, table: &str) -> String {
    format!("{} -t {} -L {} -vn --line-numbers", IPTABLES_CMD, table, chain)
}

/// Build rule deletion command
pub fn build_delete_cmd(chain: &str, table: &str, rule_number: u32) -> String {
    format!("{} -t {} -D {} {}", IPTABLES_CMD, table, chain, rule_number)
}

/// Result of scanning a chain listing for an interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleLookup {
    /// The listing had no rules
    Empty,
    /// Rules exist but none has the interface as input
    NoMatch,
    /// Lowest-numbered rule with the interface as input
    Found(u32),
}

/// Scans `iptables -L <chain> -vn --line-numbers` output.
///
/// Header lines are skipped; the first rule whose `in` column equals
/// `intf` wins.
pub fn find_rule_number(listing: &str, intf: &str) -> RuleLookup {
    let mut saw_rule = false;

    for line in listing.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let number = match fields.first().and_then(|f| f.parse::<u32>().ok()) {
            Some(number) => number,
            None => continue,
        };
        saw_rule = true;

        if fields.get(LISTING_IN_COLUMN) == Some(&intf) {
            return RuleLookup::Found(number);
        }
    }

    if saw_rule {
        RuleLookup::NoMatch
    } else {
        RuleLookup::Empty
    }
}

/// Installs and removes the per-interface NFLOG rule
pub struct NflogRuleManager<'a> {
    runner: &'a dyn CommandRunner,
    spec: NflogHookSpec,
}

impl<'a> NflogRuleManager<'a> {
    pub fn new(runner: &'a dyn CommandRunner, spec: NflogHookSpec) -> Self {
        Self { runner, spec }
    }

    /// Inserts the rule at the head of every hook chain
    #[instrument(skip(self))]
    pub async fn install(&self, intf: &str) -> FlowAcctResult<()> {
        for (chain, table) in &self.spec.hooks {
            let cmd = build_insert_cmd(chain, table, intf, &self.spec);
            self.runner.exec_or_throw(&cmd).await?;
            info!("Installed NFLOG rule for {} in {}/{}", intf, table, chain);
        }
        Ok(())
    }

    /// Deletes the first rule matching `intf` from every hook chain
    #[instrument(skip(self))]
    pub async fn remove(&self, intf: &str) -> FlowAcctResult<()> {
        for (chain, table) in &self.spec.hooks {
            let listing = self
                .runner
                .exec_or_throw(&build_list_cmd(chain, table))
                .await?;

            let rule_number = match find_rule_number(&listing, intf) {
                RuleLookup::Found(number) => number,
                RuleLookup::Empty => {
                    return Err(FlowAcctError::EmptyChain {
                        table: table.to_string(),
                        chain: chain.to_string(),
                    })
                }
                RuleLookup::NoMatch => {
                    return Err(FlowAcctError::RuleNotFound {
                        table: table.to_string(),
                        chain: chain.to_string(),
                        interface: intf.to_string(),
                    })
                }
            };

            debug!("Rule {} in {}/{} matches {}", rule_number, table, chain, intf);
            self.runner
                .exec_or_throw(&build_delete_cmd(chain, table, rule_number))
                .await?;
            info!("Removed NFLOG rule for {} from {}/{}", intf, table, chain);
        }
        Ok(())
    }
}
