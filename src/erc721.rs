// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! ERC-721 token core used by the market.
//!
//! [`Erc721`] keeps ownership, approvals and a per-token URI, and is meant to be
//! inherited by the entrypoint. The name and symbol come from [`Erc721Params`].

use alloc::{string::String, vec::Vec};
use alloy_primitives::{Address, FixedBytes, U256};
use alloy_sol_types::sol;
use core::{borrow::BorrowMut, marker::PhantomData};
use stylus_sdk::stylus_core::calls::Call;
use stylus_sdk::{abi::Bytes, evm, prelude::*};

pub trait Erc721Params {
    /// Collection name returned by `name()`.
    const NAME: &'static str;

    /// Collection symbol returned by `symbol()`.
    const SYMBOL: &'static str;
}

sol_storage! {
    pub struct Erc721<T: Erc721Params> {
        mapping(uint256 => address) owners;
        mapping(address => uint256) balances;
        /// Single-token approvals, cleared on every transfer
        mapping(uint256 => address) token_approvals;
        /// owner => operator => may move every token of owner
        mapping(address => mapping(address => bool)) operator_approvals;
        mapping(uint256 => string) token_uris;
        /// Number of ids ever minted, also the next id to mint
        uint256 total_supply;
        PhantomData<T> phantom;
    }
}

sol! {
    event Transfer(address indexed from, address indexed to, uint256 indexed tokenId);
    event Approval(address indexed owner, address indexed approved, uint256 indexed tokenId);
    event ApprovalForAll(address indexed owner, address indexed operator, bool approved);

    #[derive(Debug)]
    error InvalidTokenId(uint256 token_id);
    #[derive(Debug)]
    error NotOwner(address from, uint256 token_id, address real_owner);
    #[derive(Debug)]
    error NotApproved(address owner, address spender, uint256 token_id);
    #[derive(Debug)]
    error TransferToZero(uint256 token_id);
    // `returned` is zero when the receiver reverted
    #[derive(Debug)]
    error ReceiverRefused(address receiver, uint256 token_id, bytes4 returned);
}

#[derive(SolidityError, Debug)]
pub enum Erc721Error {
    InvalidTokenId(InvalidTokenId),
    NotOwner(NotOwner),
    NotApproved(NotApproved),
    TransferToZero(TransferToZero),
    ReceiverRefused(ReceiverRefused),
}

sol_interface! {
    interface IERC721TokenReceiver {
        function onERC721Received(address operator, address from, uint256 token_id, bytes data) external returns(bytes4);
    }
}

/// What a contract returns from `onERC721Received` to accept a token.
pub const ERC721_TOKEN_RECEIVER_ID: u32 = 0x150b7a02;

impl<T: Erc721Params> Erc721<T> {
    /// Whether `account` may act on `owner`'s `token_id`.
    fn can_manage(&self, account: Address, owner: Address, token_id: U256) -> bool {
        account == owner
            || self.operator_approvals.getter(owner).get(account)
            || account == self.token_approvals.get(token_id)
    }

    /// `from` must own `token_id` and msg_sender must be allowed to move it.
    fn require_authorized_to_spend(
        &self,
        from: Address,
        token_id: U256,
    ) -> Result<(), Erc721Error> {
        let owner = self.owner_of(token_id)?;
        if from != owner {
            return Err(Erc721Error::NotOwner(NotOwner {
                from,
                token_id,
                real_owner: owner,
            }));
        }

        let spender = self.vm().msg_sender();
        if !self.can_manage(spender, owner, token_id) {
            return Err(Erc721Error::NotApproved(NotApproved {
                owner,
                spender,
                token_id,
            }));
        }
        Ok(())
    }

    /// Moves `token_id` from `from` to `to` without checking the caller.
    ///
    /// `from` must be the current owner. Minting passes the zero address as `from`.
    pub fn transfer(
        &mut self,
        token_id: U256,
        from: Address,
        to: Address,
    ) -> Result<(), Erc721Error> {
        let mut owner = self.owners.setter(token_id);
        let real_owner = owner.get();
        if real_owner != from {
            return Err(Erc721Error::NotOwner(NotOwner {
                from,
                token_id,
                real_owner,
            }));
        }
        owner.set(to);

        if !from.is_zero() {
            let mut balance = self.balances.setter(from);
            let remaining = balance.get() - U256::from(1);
            balance.set(remaining);
        }
        if !to.is_zero() {
            let mut balance = self.balances.setter(to);
            let held = balance.get() + U256::from(1);
            balance.set(held);
        }
        self.token_approvals.delete(token_id);

        evm::log(
            self.vm(),
            Transfer {
                from,
                to,
                tokenId: token_id,
            },
        );
        Ok(())
    }

    /// Asks `to` to accept the token when it has code. Accounts without code
    /// always accept.
    fn call_receiver<S: TopLevelStorage + BorrowMut<Self>>(
        storage: &mut S,
        token_id: U256,
        from: Address,
        to: Address,
        data: Vec<u8>,
    ) -> Result<(), Erc721Error> {
        if storage.borrow().vm().code_size(to) == 0 {
            return Ok(());
        }

        let operator = storage.borrow().vm().msg_sender();
        let context = Call::new_mutating(storage);
        let receiver = IERC721TokenReceiver::new(to);
        let refused = |returned: [u8; 4]| {
            Erc721Error::ReceiverRefused(ReceiverRefused {
                receiver: to,
                token_id,
                returned: FixedBytes(returned),
            })
        };

        let returned = receiver
            .on_erc_721_received(
                storage.borrow_mut().vm(),
                context,
                operator,
                from,
                token_id,
                data.into(),
            )
            .map_err(|_e| refused([0; 4]))?
            .0;
        if u32::from_be_bytes(returned) != ERC721_TOKEN_RECEIVER_ID {
            return Err(refused(returned));
        }
        Ok(())
    }

    /// [`Self::transfer`] followed by the receiver check.
    pub fn safe_transfer<S: TopLevelStorage + BorrowMut<Self>>(
        storage: &mut S,
        token_id: U256,
        from: Address,
        to: Address,
        data: Vec<u8>,
    ) -> Result<(), Erc721Error> {
        storage.borrow_mut().transfer(token_id, from, to)?;
        Self::call_receiver(storage, token_id, from, to, data)
    }

    /// Mints the next token id to `to` and returns it.
    pub fn mint(&mut self, to: Address) -> Result<U256, Erc721Error> {
        let token_id = self.total_supply.get();
        if to.is_zero() {
            return Err(Erc721Error::TransferToZero(TransferToZero { token_id }));
        }
        self.total_supply.set(token_id + U256::from(1u8));
        self.transfer(token_id, Address::ZERO, to)?;
        Ok(token_id)
    }

    /// Mints the next token id to `to`, then checks that `to` accepts it.
    pub fn safe_mint<S: TopLevelStorage + BorrowMut<Self>>(
        storage: &mut S,
        to: Address,
        data: Vec<u8>,
    ) -> Result<U256, Erc721Error> {
        let token_id = storage.borrow_mut().mint(to)?;
        Self::call_receiver(storage, token_id, Address::ZERO, to, data)?;
        Ok(token_id)
    }

    /// Stores the metadata URI of an existing token.
    pub fn set_token_uri(&mut self, token_id: U256, uri: &str) -> Result<(), Erc721Error> {
        self.owner_of(token_id)?;
        self.token_uris.setter(token_id).set_str(uri);
        Ok(())
    }

    /// Number of ids ever minted.
    pub fn minted(&self) -> U256 {
        self.total_supply.get()
    }
}

#[public]
impl<T: Erc721Params> Erc721<T> {
    pub fn name() -> Result<String, Erc721Error> {
        Ok(T::NAME.into())
    }

    pub fn symbol() -> Result<String, Erc721Error> {
        Ok(T::SYMBOL.into())
    }

    /// The URI given to `createNFT` for this token.
    #[selector(name = "tokenURI")]
    pub fn token_uri(&self, token_id: U256) -> Result<String, Erc721Error> {
        self.owner_of(token_id)?;
        Ok(self.token_uris.getter(token_id).get_string())
    }

    pub fn balance_of(&self, owner: Address) -> Result<U256, Erc721Error> {
        Ok(self.balances.get(owner))
    }

    /// Fails with `InvalidTokenId` for ids that were never minted.
    pub fn owner_of(&self, token_id: U256) -> Result<Address, Erc721Error> {
        let owner = self.owners.get(token_id);
        if owner.is_zero() {
            return Err(Erc721Error::InvalidTokenId(InvalidTokenId { token_id }));
        }
        Ok(owner)
    }

    /// `safeTransferFrom(address,address,uint256,bytes)`: `data` is handed to
    /// the receiver's `onERC721Received`.
    #[selector(name = "safeTransferFrom")]
    pub fn safe_transfer_from_with_data<S: TopLevelStorage + BorrowMut<Self>>(
        storage: &mut S,
        from: Address,
        to: Address,
        token_id: U256,
        data: Bytes,
    ) -> Result<(), Erc721Error> {
        if to.is_zero() {
            return Err(Erc721Error::TransferToZero(TransferToZero { token_id }));
        }
        storage
            .borrow_mut()
            .require_authorized_to_spend(from, token_id)?;
        Self::safe_transfer(storage, token_id, from, to, data.0)
    }

    /// `safeTransferFrom(address,address,uint256)`
    #[selector(name = "safeTransferFrom")]
    pub fn safe_transfer_from<S: TopLevelStorage + BorrowMut<Self>>(
        storage: &mut S,
        from: Address,
        to: Address,
        token_id: U256,
    ) -> Result<(), Erc721Error> {
        Self::safe_transfer_from_with_data(storage, from, to, token_id, Bytes(Vec::new()))
    }

    pub fn transfer_from(
        &mut self,
        from: Address,
        to: Address,
        token_id: U256,
    ) -> Result<(), Erc721Error> {
        if to.is_zero() {
            return Err(Erc721Error::TransferToZero(TransferToZero { token_id }));
        }
        self.require_authorized_to_spend(from, token_id)?;
        self.transfer(token_id, from, to)
    }

    /// Only the owner or one of its operators may approve.
    pub fn approve(&mut self, approved: Address, token_id: U256) -> Result<(), Erc721Error> {
        let owner = self.owner_of(token_id)?;
        let spender = self.vm().msg_sender();
        if spender != owner && !self.operator_approvals.getter(owner).get(spender) {
            return Err(Erc721Error::NotApproved(NotApproved {
                owner,
                spender,
                token_id,
            }));
        }
        self.token_approvals.insert(token_id, approved);

        evm::log(
            self.vm(),
            Approval {
                owner,
                approved,
                tokenId: token_id,
            },
        );
        Ok(())
    }

    pub fn set_approval_for_all(
        &mut self,
        operator: Address,
        approved: bool,
    ) -> Result<(), Erc721Error> {
        let owner = self.vm().msg_sender();
        self.operator_approvals
            .setter(owner)
            .insert(operator, approved);

        evm::log(
            self.vm(),
            ApprovalForAll {
                owner,
                operator,
                approved,
            },
        );
        Ok(())
    }

    /// Zero when nobody is approved for the token.
    pub fn get_approved(&self, token_id: U256) -> Result<Address, Erc721Error> {
        Ok(self.token_approvals.get(token_id))
    }

    pub fn is_approved_for_all(
        &self,
        owner: Address,
        operator: Address,
    ) -> Result<bool, Erc721Error> {
        Ok(self.operator_approvals.getter(owner).get(operator))
    }

    /// ERC-165 for ERC-165 itself, ERC-721 and the metadata extension.
    pub fn supports_interface(interface: FixedBytes<4>) -> Result<bool, Erc721Error> {
        const IERC165: u32 = 0x01ffc9a7;
        const IERC721: u32 = 0x80ac58cd;
        const IERC721_METADATA: u32 = 0x5b5e139f;

        // 0xffffffff matches none of these, as ERC-165 requires
        Ok(matches!(
            u32::from_be_bytes(interface.0),
            IERC165 | IERC721 | IERC721_METADATA
        ))
    }
}
