use chain_crypto::Address;
use chain_state::WorldState;

use crate::error::{ContractError, Result};

/// Pure state-mutating handlers for balance/stake movement (§4.4). No
/// handler performs gas accounting — that is the processor's duty.
pub struct TokenContract;

impl TokenContract {
    /// `transfer{to, amount}`. Creates the recipient on demand.
    pub fn transfer(world_state: &WorldState, sender: &Address, to: &Address, amount: u64) -> Result<()> {
        let mut from_account = world_state
            .get(sender)?
            .ok_or(ContractError::UnknownSender)?;
        if from_account.balance < amount {
            return Err(ContractError::InsufficientBalance {
                available: from_account.balance,
                required: amount,
            });
        }

        let mut to_account = world_state.get_or_create(to)?;
        from_account.balance -= amount;
        to_account.balance += amount;

        if from_account.address == to_account.address {
            world_state.update(&from_account)?;
        } else {
            world_state.commit(&[from_account, to_account])?;
        }
        Ok(())
    }

    /// `stake{amount}`: moves `amount` from balance to stake on the same account.
    pub fn stake(world_state: &WorldState, sender: &Address, amount: u64) -> Result<()> {
        let mut account = world_state
            .get(sender)?
            .ok_or(ContractError::UnknownSender)?;
        if account.balance < amount {
            return Err(ContractError::InsufficientBalance {
                available: account.balance,
                required: amount,
            });
        }
        account.balance -= amount;
        account.stake += amount;
        world_state.update(&account)?;
        Ok(())
    }

    /// `slash{target, amount}`: clamps `amount` to the target's current
    /// stake and burns it (no credited destination).
    pub fn slash(world_state: &WorldState, target: &Address, amount: u64) -> Result<()> {
        let mut account = world_state
            .get(target)?
            .ok_or(ContractError::UnknownSender)?;
        let burned = amount.min(account.stake);
        account.stake -= burned;
        world_state.update(&account)?;
        Ok(())
    }

    /// `reward{target, amount, reputation, memo}`: debits `sender`
    /// (normally the Treasury), credits `target`, adjusts its reputation.
    pub fn reward(
        world_state: &WorldState,
        sender: &Address,
        target: &Address,
        amount: u64,
        reputation_delta: i32,
    ) -> Result<()> {
        let mut funder = world_state
            .get(sender)?
            .ok_or(ContractError::UnknownSender)?;
        if funder.balance < amount {
            return Err(ContractError::InsufficientBalance {
                available: funder.balance,
                required: amount,
            });
        }
        let mut recipient = world_state.get_or_create(target)?;

        funder.balance -= amount;
        recipient.balance += amount;
        recipient.adjust_reputation(reputation_delta);

        if funder.address == recipient.address {
            world_state.update(&funder)?;
        } else {
            world_state.commit(&[funder, recipient])?;
        }
        Ok(())
    }

    /// `penalty{target, amount, reputation, memo}`: clamps `amount` to the
    /// target's balance, debits it, credits `sender` (the Treasury).
    pub fn penalty(
        world_state: &WorldState,
        sender: &Address,
        target: &Address,
        amount: u64,
        reputation_delta: i32,
    ) -> Result<()> {
        let mut victim = world_state
            .get(target)?
            .ok_or(ContractError::UnknownSender)?;
        let mut treasury = world_state.get_or_create(sender)?;

        let deducted = amount.min(victim.balance);
        victim.balance -= deducted;
        treasury.balance += deducted;
        victim.adjust_reputation(reputation_delta);

        if victim.address == treasury.address {
            world_state.update(&victim)?;
        } else {
            world_state.commit(&[victim, treasury])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_crypto::KeyPair;

    fn addr() -> Address {
        Address::from_public_key(&KeyPair::generate().public_key_bytes())
    }

    fn funded(ws: &WorldState, balance: u64) -> Address {
        let a = addr();
        let mut account = ws.create(&a).unwrap();
        account.balance = balance;
        ws.update(&account).unwrap();
        a
    }

    #[test]
    fn transfer_moves_balance_and_creates_recipient() {
        let ws = WorldState::open_temporary().unwrap();
        let alice = funded(&ws, 1000);
        let bob = addr();

        TokenContract::transfer(&ws, &alice, &bob, 300).unwrap();

        assert_eq!(ws.get(&alice).unwrap().unwrap().balance, 700);
        assert_eq!(ws.get(&bob).unwrap().unwrap().balance, 300);
    }

    #[test]
    fn transfer_rejects_insufficient_balance() {
        let ws = WorldState::open_temporary().unwrap();
        let alice = funded(&ws, 100);
        let bob = addr();
        assert!(TokenContract::transfer(&ws, &alice, &bob, 300).is_err());
    }

    #[test]
    fn stake_moves_balance_to_stake() {
        let ws = WorldState::open_temporary().unwrap();
        let alice = funded(&ws, 1000);
        TokenContract::stake(&ws, &alice, 400).unwrap();
        let account = ws.get(&alice).unwrap().unwrap();
        assert_eq!(account.balance, 600);
        assert_eq!(account.stake, 400);
    }

    #[test]
    fn slash_clamps_to_current_stake() {
        let ws = WorldState::open_temporary().unwrap();
        let alice = funded(&ws, 1000);
        TokenContract::stake(&ws, &alice, 100).unwrap();
        TokenContract::slash(&ws, &alice, 500).unwrap();
        assert_eq!(ws.get(&alice).unwrap().unwrap().stake, 0);
    }

    #[test]
    fn reward_credits_target_and_bumps_reputation() {
        let ws = WorldState::open_temporary().unwrap();
        let treasury = funded(&ws, 10_000);
        let target = addr();
        TokenContract::reward(&ws, &treasury, &target, 800, 5).unwrap();
        let account = ws.get(&target).unwrap().unwrap();
        assert_eq!(account.balance, 800);
        assert_eq!(account.reputation, 100);
    }

    #[test]
    fn penalty_clamps_to_target_balance() {
        let ws = WorldState::open_temporary().unwrap();
        let treasury = funded(&ws, 0);
        let target = funded(&ws, 50);
        TokenContract::penalty(&ws, &treasury, &target, 300, -1).unwrap();
        assert_eq!(ws.get(&target).unwrap().unwrap().balance, 0);
        assert_eq!(ws.get(&treasury).unwrap().unwrap().balance, 50);
    }
}
