// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

// Only run this as a WASM if the export-abi feature is not set.
#![cfg_attr(not(any(feature = "export-abi", test)), no_main)]
extern crate alloc;

pub mod erc721;
pub mod ownable;

use crate::erc721::{
    Erc721, Erc721Error, Erc721Params, InvalidTokenId, NotApproved, NotOwner, ReceiverRefused,
    TransferToZero,
};
use crate::ownable::{Ownable, OwnableError, OwnableInvalidOwner, OwnableUnauthorizedAccount};
use alloc::{string::String, vec::Vec};
use alloy_primitives::{Address, U256};
use alloy_sol_types::sol;
use stylus_sdk::{console, evm, prelude::*};

/// Share of the sale price paid to the seller, in percent. The rest stays in
/// the market until the owner withdraws it.
pub const SELLER_SHARE_PERCENT: u64 = 95;

/// Immutable collection definitions
pub struct NftMarketParams;
impl Erc721Params for NftMarketParams {
    const NAME: &'static str = "NFT Market";
    const SYMBOL: &'static str = "NFTM";
}

sol_storage! {
    /// A token held in escrow by the market. Listed iff `price` is non-zero.
    pub struct Listing {
        uint256 price;
        address seller;
    }

    #[entrypoint]
    pub struct NftMarket {
        #[borrow]
        Erc721<NftMarketParams> erc721;
        #[borrow]
        Ownable ownable;
        mapping(uint256 => Listing) listings;
    }
}

sol! {
    event NFTTransfer(uint256 tokenID, address from, address to, string tokenURI, uint256 price);

    #[derive(Debug)]
    error InvalidPrice(uint256 token_id);
    #[derive(Debug)]
    error NotListed(uint256 token_id);
    #[derive(Debug)]
    error IncorrectPrice(uint256 token_id, uint256 price, uint256 value);
    #[derive(Debug)]
    error NotSeller(uint256 token_id, address account);
    #[derive(Debug)]
    error NoFunds();
    #[derive(Debug)]
    error PaymentFailed(address to, uint256 amount);
}

#[derive(SolidityError, Debug)]
pub enum MarketError {
    InvalidTokenId(InvalidTokenId),
    NotOwner(NotOwner),
    NotApproved(NotApproved),
    TransferToZero(TransferToZero),
    ReceiverRefused(ReceiverRefused),
    OwnableUnauthorizedAccount(OwnableUnauthorizedAccount),
    OwnableInvalidOwner(OwnableInvalidOwner),
    InvalidPrice(InvalidPrice),
    NotListed(NotListed),
    IncorrectPrice(IncorrectPrice),
    NotSeller(NotSeller),
    NoFunds(NoFunds),
    PaymentFailed(PaymentFailed),
}

impl From<Erc721Error> for MarketError {
    fn from(err: Erc721Error) -> Self {
        match err {
            Erc721Error::InvalidTokenId(e) => MarketError::InvalidTokenId(e),
            Erc721Error::NotOwner(e) => MarketError::NotOwner(e),
            Erc721Error::NotApproved(e) => MarketError::NotApproved(e),
            Erc721Error::TransferToZero(e) => MarketError::TransferToZero(e),
            Erc721Error::ReceiverRefused(e) => MarketError::ReceiverRefused(e),
        }
    }
}

impl From<OwnableError> for MarketError {
    fn from(err: OwnableError) -> Self {
        match err {
            OwnableError::OwnableUnauthorizedAccount(e) => {
                MarketError::OwnableUnauthorizedAccount(e)
            }
            OwnableError::OwnableInvalidOwner(e) => MarketError::OwnableInvalidOwner(e),
        }
    }
}

impl NftMarket {
    /// Returns `(price, seller)` of a listed token.
    fn listing(&self, token_id: U256) -> Result<(U256, Address), MarketError> {
        let listing = self.listings.get(token_id);
        let price = listing.price.get();
        if price.is_zero() {
            return Err(MarketError::NotListed(NotListed { token_id }));
        }
        Ok((price, listing.seller.get()))
    }

    fn clear_listing(&mut self, token_id: U256) {
        let mut listing = self.listings.setter(token_id);
        listing.price.set(U256::ZERO);
        listing.seller.set(Address::ZERO);
    }

    /// Sends `amount` wei to `to`. Callers must have committed their state first.
    fn pay(&mut self, to: Address, amount: U256) -> Result<(), MarketError> {
        let context = Call::new_payable(self, amount);
        call(self.vm(), context, to, &[])
            .map_err(|_e| MarketError::PaymentFailed(PaymentFailed { to, amount }))?;
        Ok(())
    }

    fn log_nft_transfer(
        &self,
        token_id: U256,
        from: Address,
        to: Address,
        uri: String,
        price: U256,
    ) {
        evm::log(
            self.vm(),
            NFTTransfer {
                tokenID: token_id,
                from,
                to,
                tokenURI: uri,
                price,
            },
        );
    }
}

#[public]
#[inherit(Erc721<NftMarketParams>, Ownable)]
impl NftMarket {
    /// The deployer becomes the owner. Uses tx_origin because deployment goes
    /// through a factory contract.
    #[constructor]
    pub fn constructor(&mut self) {
        let owner = self.vm().tx_origin();
        self.ownable.set_owner(owner);
    }

    /// Mints a token with the given metadata URI to the caller.
    ///
    /// The first event emitted is the ERC-721 `Transfer` carrying the new
    /// `tokenId`, followed by `NFTTransfer`.
    #[selector(name = "createNFT")]
    pub fn create_nft(&mut self, token_uri: String) -> Result<U256, MarketError> {
        let minter = self.vm().msg_sender();
        let token_id = Erc721::<NftMarketParams>::safe_mint(self, minter, Vec::new())?;
        self.erc721.set_token_uri(token_id, &token_uri)?;
        console!("minted token {token_id} to {minter}");

        self.log_nft_transfer(token_id, Address::ZERO, minter, token_uri, U256::ZERO);
        Ok(token_id)
    }

    /// Puts the caller's token up for sale. The market holds the token until
    /// it is bought or the listing is cancelled.
    #[selector(name = "listNFT")]
    pub fn list_nft(&mut self, token_id: U256, price: U256) -> Result<(), MarketError> {
        if price.is_zero() {
            return Err(MarketError::InvalidPrice(InvalidPrice { token_id }));
        }
        let seller = self.vm().msg_sender();
        let market = self.vm().contract_address();
        self.erc721.transfer_from(seller, market, token_id)?;

        let mut listing = self.listings.setter(token_id);
        listing.price.set(price);
        listing.seller.set(seller);
        console!("listed token {token_id} for {price}");

        self.log_nft_transfer(token_id, seller, market, String::new(), price);
        Ok(())
    }

    /// Buys a listed token. The value sent must equal the asking price.
    #[payable]
    #[selector(name = "buyNFT")]
    pub fn buy_nft(&mut self, token_id: U256) -> Result<(), MarketError> {
        let (price, seller) = self.listing(token_id)?;
        let value = self.vm().msg_value();
        if value != price {
            return Err(MarketError::IncorrectPrice(IncorrectPrice {
                token_id,
                price,
                value,
            }));
        }

        let buyer = self.vm().msg_sender();
        let market = self.vm().contract_address();
        self.clear_listing(token_id);
        self.erc721.transfer(token_id, market, buyer)?;
        self.log_nft_transfer(token_id, market, buyer, String::new(), U256::ZERO);

        let proceeds = price * U256::from(SELLER_SHARE_PERCENT) / U256::from(100);
        self.pay(seller, proceeds)?;
        console!("sold token {token_id} to {buyer}, paid {proceeds} to {seller}");
        Ok(())
    }

    /// Withdraws a listing and returns the token to its seller.
    pub fn cancel_listing(&mut self, token_id: U256) -> Result<(), MarketError> {
        let (_, seller) = self.listing(token_id)?;
        let account = self.vm().msg_sender();
        if account != seller {
            return Err(MarketError::NotSeller(NotSeller { token_id, account }));
        }

        let market = self.vm().contract_address();
        self.clear_listing(token_id);
        self.erc721.transfer(token_id, market, seller)?;

        self.log_nft_transfer(token_id, market, seller, String::new(), U256::ZERO);
        Ok(())
    }

    /// Price and seller of a token, or zeroes if it is not listed.
    pub fn get_listing(&self, token_id: U256) -> (U256, Address) {
        let listing = self.listings.get(token_id);
        (listing.price.get(), listing.seller.get())
    }

    /// Sends the market's whole balance to the owner.
    pub fn withdraw_funds(&mut self) -> Result<(), MarketError> {
        self.ownable.only_owner()?;
        let balance = self.vm().balance(self.vm().contract_address());
        if balance.is_zero() {
            return Err(MarketError::NoFunds(NoFunds {}));
        }
        let owner = self.ownable.owner();
        self.pay(owner, balance)?;
        console!("withdrew {balance} to {owner}");
        Ok(())
    }

    /// Number of tokens ever minted.
    pub fn total_supply(&self) -> U256 {
        self.erc721.minted()
    }
}
