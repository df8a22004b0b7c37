// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Single-owner access control.

use alloy_primitives::Address;
use alloy_sol_types::sol;
use stylus_sdk::{evm, prelude::*};

sol_storage! {
    pub struct Ownable {
        address owner;
    }
}

sol! {
    event OwnershipTransferred(address indexed previous_owner, address indexed new_owner);

    #[derive(Debug)]
    error OwnableUnauthorizedAccount(address account);
    #[derive(Debug)]
    error OwnableInvalidOwner(address owner);
}

#[derive(SolidityError, Debug)]
pub enum OwnableError {
    OwnableUnauthorizedAccount(OwnableUnauthorizedAccount),
    OwnableInvalidOwner(OwnableInvalidOwner),
}

impl Ownable {
    /// Fails unless msg_sender is the current owner.
    pub fn only_owner(&self) -> Result<(), OwnableError> {
        let account = self.vm().msg_sender();
        if account != self.owner.get() {
            return Err(OwnableError::OwnableUnauthorizedAccount(
                OwnableUnauthorizedAccount { account },
            ));
        }
        Ok(())
    }

    /// Replaces the owner without any access check.
    pub fn set_owner(&mut self, new_owner: Address) {
        let previous_owner = self.owner.get();
        self.owner.set(new_owner);
        evm::log(
            self.vm(),
            OwnershipTransferred {
                previous_owner,
                new_owner,
            },
        );
    }
}

#[public]
impl Ownable {
    pub fn owner(&self) -> Address {
        self.owner.get()
    }

    pub fn transfer_ownership(&mut self, new_owner: Address) -> Result<(), OwnableError> {
        self.only_owner()?;
        if new_owner.is_zero() {
            return Err(OwnableError::OwnableInvalidOwner(OwnableInvalidOwner {
                owner: new_owner,
            }));
        }
        self.set_owner(new_owner);
        Ok(())
    }

    /// Leaves the contract without an owner. Owner-only operations become unreachable.
    pub fn renounce_ownership(&mut self) -> Result<(), OwnableError> {
        self.only_owner()?;
        self.set_owner(Address::ZERO);
        Ok(())
    }
}
