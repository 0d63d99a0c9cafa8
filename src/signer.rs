use anyhow::{Context, Result};
use ethers::prelude::*;
use ethers::types::transaction::eip712::{Eip712, TypedData};
use ethers::utils::hex;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::json;
use std::str::FromStr;
use uuid::Uuid;

use crate::types::{Order, OrderType, Side, SignedOrder};

// Polymarket Exchange contract addresses on Polygon
const CTF_EXCHANGE_ADDRESS: &str = "0x4bFb41d5B3570DeFd03C39a9A4D8dE6Bd8B8982E";
const NEG_RISK_CTF_EXCHANGE_ADDRESS: &str = "0xC5d563A36AE78145C45a50134d48A1215220f80a";
const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// USDC and conditional tokens both use 6 decimals
const BASE_UNITS: u32 = 1_000_000;
const SIZE_DECIMALS: u32 = 2;

/// EIP-712 Order Signer for Polymarket
pub struct OrderSigner {
    wallet: LocalWallet,
    address: Address,
    funder: Address,
    signature_type: u8,
    owner: String,
}

impl OrderSigner {
    /// `funder_address` defaults to the signing wallet
    pub fn new(private_key: &str, chain_id: u64, funder_address: Option<&str>) -> Result<Self> {
        let wallet = private_key
            .trim_start_matches("0x")
            .parse::<LocalWallet>()
            .context("Invalid private key")?
            .with_chain_id(chain_id);

        let address = wallet.address();
        let funder = match funder_address {
            Some(f) => Address::from_str(f).context("Invalid funder address")?,
            None => address,
        };

        Ok(Self {
            wallet,
            address,
            funder,
            signature_type: 0,
            owner: String::new(),
        })
    }

    /// 0 = EOA, 1 = Polymarket proxy, 2 = Gnosis safe
    pub fn with_signature_type(mut self, signature_type: u8) -> Self {
        self.signature_type = signature_type;
        self
    }

    /// API key the exchange books submitted orders under
    pub fn with_owner(mut self, api_key: &str) -> Self {
        self.owner = api_key.to_string();
        self
    }

    pub fn wallet(&self) -> &LocalWallet {
        &self.wallet
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Create and sign a GTC limit order.
    ///
    /// `price` is snapped to `tick_size` and `size` is rounded down to
    /// two decimals before amounts are computed.
    pub async fn create_order(
        &self,
        token_id: &str,
        price: Decimal,
        size: Decimal,
        side: Side,
        tick_size: Decimal,
        neg_risk: bool,
    ) -> Result<Order> {
        let price = round_to_tick(price, tick_size);
        let size = size.round_dp_with_strategy(SIZE_DECIMALS, RoundingStrategy::ToZero);
        if price <= Decimal::ZERO || size <= Decimal::ZERO {
            anyhow::bail!("Cannot sign order with price {} and size {}", price, size);
        }

        let (maker_amount, taker_amount) = order_amounts(side, price, size);

        let salt = Uuid::new_v4().as_u128().to_string();
        // GTC orders never expire
        let expiration = "0".to_string();

        let order_data = json!({
            "salt": salt,
            "maker": format!("{:?}", self.funder),
            "signer": format!("{:?}", self.address),
            "taker": ZERO_ADDRESS,
            "tokenId": token_id,
            "makerAmount": maker_amount,
            "takerAmount": taker_amount,
            "expiration": expiration,
            "nonce": "0",
            "feeRateBps": "0",
            "side": if matches!(side, Side::Buy) { 0 } else { 1 },
            "signatureType": self.signature_type
        });

        let signature = self.sign_order(&order_data, neg_risk)?;

        let signed_order = SignedOrder {
            salt,
            maker: format!("{:?}", self.funder),
            signer: format!("{:?}", self.address),
            taker: ZERO_ADDRESS.to_string(),
            token_id: token_id.to_string(),
            maker_amount,
            taker_amount,
            expiration,
            nonce: "0".to_string(),
            fee_rate_bps: "0".to_string(),
            side,
            signature_type: self.signature_type,
            signature,
        };

        Ok(Order {
            order: signed_order,
            owner: self.owner.clone(),
            order_type: OrderType::Gtc,
        })
    }

    /// Sign order using EIP-712
    fn sign_order(&self, order: &serde_json::Value, neg_risk: bool) -> Result<String> {
        let exchange_address = if neg_risk {
            NEG_RISK_CTF_EXCHANGE_ADDRESS
        } else {
            CTF_EXCHANGE_ADDRESS
        };

        let typed_data = json!({
            "types": {
                "EIP712Domain": [
                    {"name": "name", "type": "string"},
                    {"name": "version", "type": "string"},
                    {"name": "chainId", "type": "uint256"},
                    {"name": "verifyingContract", "type": "address"}
                ],
                "Order": [
                    {"name": "salt", "type": "uint256"},
                    {"name": "maker", "type": "address"},
                    {"name": "signer", "type": "address"},
                    {"name": "taker", "type": "address"},
                    {"name": "tokenId", "type": "uint256"},
                    {"name": "makerAmount", "type": "uint256"},
                    {"name": "takerAmount", "type": "uint256"},
                    {"name": "expiration", "type": "uint256"},
                    {"name": "nonce", "type": "uint256"},
                    {"name": "feeRateBps", "type": "uint256"},
                    {"name": "side", "type": "uint8"},
                    {"name": "signatureType", "type": "uint8"}
                ]
            },
            "primaryType": "Order",
            "domain": {
                "name": "Polymarket CTF Exchange",
                "version": "1",
                "chainId": self.wallet.chain_id(),
                "verifyingContract": exchange_address
            },
            "message": order
        });

        let typed_data: TypedData = serde_json::from_value(typed_data)?;
        let hash = typed_data.encode_eip712()?;
        let signature = self.wallet.sign_hash(H256::from(hash))?;

        Ok(format!("0x{}", hex::encode(signature.to_vec())))
    }
}

/// Snap `price` to the nearest multiple of `tick_size` (halves round up),
/// kept within `[tick_size, 1 - tick_size]`
pub fn round_to_tick(price: Decimal, tick_size: Decimal) -> Decimal {
    if tick_size <= Decimal::ZERO {
        return price;
    }
    let ticks =
        (price / tick_size).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    (ticks * tick_size)
        .max(tick_size)
        .min(Decimal::ONE - tick_size)
        .normalize()
}

/// (maker, taker) amounts in base units.
///
/// BUY pays USDC (maker) for shares (taker); SELL is the reverse.
fn order_amounts(side: Side, price: Decimal, size: Decimal) -> (String, String) {
    let scale = Decimal::from(BASE_UNITS);
    let cost_raw = (size * price * scale).round().to_string();
    let shares_raw = (size * scale).round().to_string();

    match side {
        Side::Buy => (cost_raw, shares_raw),
        Side::Sell => (shares_raw, cost_raw),
    }
}
