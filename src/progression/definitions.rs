//! Achievement definitions and metadata
//!
//! Every achievement a learner can unlock is defined here with its reward and
//! category. The catalog is fixed for the lifetime of the process.

use serde::{Deserialize, Serialize};

/// Unique identifier for each achievement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AchievementId {
    // Wallet & connection
    WalletConnected,
    SmartWalletCreated,

    // Transactions
    FirstTransaction,
    SponsoredTransaction,

    // Swap & trading
    FirstSwap,
    SwapExpert,

    // NFT & minting
    FirstNftMint,
    NftCollection,

    // Identity & basenames
    BasenameRegistered,
    ProfileComplete,

    // DeFi & earning
    FirstEarn,
    CryptoPurchase,

    // Advanced features
    SpendPermission,
    SubAccount,
    NotificationSetup,
    BaseMaster,
}

impl AchievementId {
    /// Stable string key (used by callers, storage and the HTTP API)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WalletConnected => "wallet_connected",
            Self::SmartWalletCreated => "smart_wallet_created",
            Self::FirstTransaction => "first_transaction",
            Self::SponsoredTransaction => "sponsored_transaction",
            Self::FirstSwap => "first_swap",
            Self::SwapExpert => "swap_expert",
            Self::FirstNftMint => "first_nft_mint",
            Self::NftCollection => "nft_collection",
            Self::BasenameRegistered => "basename_registered",
            Self::ProfileComplete => "profile_complete",
            Self::FirstEarn => "first_earn",
            Self::CryptoPurchase => "crypto_purchase",
            Self::SpendPermission => "spend_permission",
            Self::SubAccount => "sub_account",
            Self::NotificationSetup => "notification_setup",
            Self::BaseMaster => "base_master",
        }
    }

    /// Parse from a string key. Unknown keys are `None`, never an error.
    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|id| id.as_str() == s)
    }

    /// All achievement IDs in catalog order
    pub fn all() -> &'static [AchievementId] {
        &[
            Self::WalletConnected,
            Self::SmartWalletCreated,
            Self::FirstTransaction,
            Self::SponsoredTransaction,
            Self::FirstSwap,
            Self::SwapExpert,
            Self::FirstNftMint,
            Self::NftCollection,
            Self::BasenameRegistered,
            Self::ProfileComplete,
            Self::FirstEarn,
            Self::CryptoPurchase,
            Self::SpendPermission,
            Self::SubAccount,
            Self::NotificationSetup,
            Self::BaseMaster,
        ]
    }
}

impl std::fmt::Display for AchievementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Achievement category for grouping in UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementCategory {
    Wallet,
    Transaction,
    Swap,
    Nft,
    Identity,
    Defi,
    Advanced,
}

impl AchievementCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wallet => "wallet",
            Self::Transaction => "transaction",
            Self::Swap => "swap",
            Self::Nft => "nft",
            Self::Identity => "identity",
            Self::Defi => "defi",
            Self::Advanced => "advanced",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Wallet => "Wallet",
            Self::Transaction => "Transactions",
            Self::Swap => "Swap",
            Self::Nft => "NFTs",
            Self::Identity => "Identity",
            Self::Defi => "DeFi",
            Self::Advanced => "Advanced",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Wallet => "🔌",
            Self::Transaction => "💸",
            Self::Swap => "🔄",
            Self::Nft => "🎨",
            Self::Identity => "🏷️",
            Self::Defi => "🌾",
            Self::Advanced => "🚀",
        }
    }

    /// All categories in tab order
    pub fn all() -> &'static [AchievementCategory] {
        &[
            Self::Wallet,
            Self::Transaction,
            Self::Swap,
            Self::Nft,
            Self::Identity,
            Self::Defi,
            Self::Advanced,
        ]
    }
}

impl std::fmt::Display for AchievementCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static achievement definition
#[derive(Debug, Clone, PartialEq)]
pub struct AchievementDef {
    pub id: AchievementId,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub category: AchievementCategory,
    pub xp: u32,
}

/// All achievement definitions, in catalog order
pub static CATALOG: &[AchievementDef] = &[
    // === WALLET ===
    AchievementDef {
        id: AchievementId::WalletConnected,
        title: "First Connection",
        description: "Connect your wallet to HowToBase",
        icon: "🔌",
        category: AchievementCategory::Wallet,
        xp: 100,
    },
    AchievementDef {
        id: AchievementId::SmartWalletCreated,
        title: "Smart Wallet Master",
        description: "Create your first Coinbase Smart Wallet",
        icon: "🧠",
        category: AchievementCategory::Wallet,
        xp: 200,
    },
    // === TRANSACTION ===
    AchievementDef {
        id: AchievementId::FirstTransaction,
        title: "Transaction Pioneer",
        description: "Send your first transaction on Base",
        icon: "💸",
        category: AchievementCategory::Transaction,
        xp: 150,
    },
    AchievementDef {
        id: AchievementId::SponsoredTransaction,
        title: "Gas-Free Hero",
        description: "Complete a sponsored transaction using Paymaster",
        icon: "⛽",
        category: AchievementCategory::Transaction,
        xp: 300,
    },
    // === SWAP ===
    AchievementDef {
        id: AchievementId::FirstSwap,
        title: "Token Trader",
        description: "Complete your first token swap",
        icon: "🔄",
        category: AchievementCategory::Swap,
        xp: 200,
    },
    AchievementDef {
        id: AchievementId::SwapExpert,
        title: "Swap Expert",
        description: "Complete 5 successful swaps",
        icon: "🏆",
        category: AchievementCategory::Swap,
        xp: 400,
    },
    // === NFT ===
    AchievementDef {
        id: AchievementId::FirstNftMint,
        title: "NFT Creator",
        description: "Mint your first NFT on Base",
        icon: "🎨",
        category: AchievementCategory::Nft,
        xp: 300,
    },
    AchievementDef {
        id: AchievementId::NftCollection,
        title: "Collector",
        description: "Mint 3 different NFTs",
        icon: "🖼️",
        category: AchievementCategory::Nft,
        xp: 500,
    },
    // === IDENTITY ===
    AchievementDef {
        id: AchievementId::BasenameRegistered,
        title: "Identity Builder",
        description: "Register your first Basename",
        icon: "🏷️",
        category: AchievementCategory::Identity,
        xp: 250,
    },
    AchievementDef {
        id: AchievementId::ProfileComplete,
        title: "Profile Master",
        description: "Complete your onchain profile",
        icon: "👤",
        category: AchievementCategory::Identity,
        xp: 200,
    },
    // === DEFI ===
    AchievementDef {
        id: AchievementId::FirstEarn,
        title: "Yield Farmer",
        description: "Start earning yield on Base",
        icon: "🌾",
        category: AchievementCategory::Defi,
        xp: 300,
    },
    AchievementDef {
        id: AchievementId::CryptoPurchase,
        title: "Crypto Shopper",
        description: "Buy crypto using Checkout component",
        icon: "🛒",
        category: AchievementCategory::Defi,
        xp: 200,
    },
    // === ADVANCED ===
    AchievementDef {
        id: AchievementId::SpendPermission,
        title: "Subscription Master",
        description: "Set up your first spend permission",
        icon: "🔐",
        category: AchievementCategory::Advanced,
        xp: 400,
    },
    AchievementDef {
        id: AchievementId::SubAccount,
        title: "Account Manager",
        description: "Create a sub-account",
        icon: "👥",
        category: AchievementCategory::Advanced,
        xp: 300,
    },
    AchievementDef {
        id: AchievementId::NotificationSetup,
        title: "Notification Ninja",
        description: "Enable push notifications",
        icon: "📱",
        category: AchievementCategory::Advanced,
        xp: 150,
    },
    AchievementDef {
        id: AchievementId::BaseMaster,
        title: "Base Master",
        description: "Complete all Base builder tutorials",
        icon: "🚀",
        category: AchievementCategory::Advanced,
        xp: 1000,
    },
];

impl AchievementDef {
    /// Look up a definition by its string key
    pub fn find(id: &str) -> Option<&'static AchievementDef> {
        let id = AchievementId::parse(id)?;
        CATALOG.iter().find(|a| a.id == id)
    }

    /// Total number of achievements
    pub fn total_count() -> usize {
        CATALOG.len()
    }

    /// Total XP obtainable from the whole catalog
    pub fn total_xp() -> u32 {
        CATALOG.iter().map(|a| a.xp).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_id_has_exactly_one_definition() {
        for id in AchievementId::all() {
            let count = CATALOG.iter().filter(|a| a.id == *id).count();
            assert_eq!(count, 1, "{} defined {} times", id, count);
        }
        assert_eq!(CATALOG.len(), AchievementId::all().len());
    }

    #[test]
    fn test_string_keys_are_unique_and_parse_back() {
        let keys: HashSet<_> = AchievementId::all().iter().map(|id| id.as_str()).collect();
        assert_eq!(keys.len(), AchievementId::all().len());

        for id in AchievementId::all() {
            assert_eq!(AchievementId::parse(id.as_str()), Some(*id));
        }
        assert_eq!(AchievementId::parse("does_not_exist"), None);
        assert_eq!(AchievementId::parse("Wallet_Connected"), None);
    }

    #[test]
    fn test_rewards_are_positive() {
        assert!(CATALOG.iter().all(|a| a.xp > 0));
        assert_eq!(AchievementDef::total_xp(), 4950);
    }

    #[test]
    fn test_category_parse_is_lenient_on_case() {
        assert_eq!(AchievementCategory::parse("nft"), Some(AchievementCategory::Nft));
        assert_eq!(AchievementCategory::parse(" DeFi "), Some(AchievementCategory::Defi));
        assert_eq!(AchievementCategory::parse("gaming"), None);
    }

    #[test]
    fn test_find_by_key() {
        let def = AchievementDef::find("wallet_connected").unwrap();
        assert_eq!(def.title, "First Connection");
        assert_eq!(def.xp, 100);
        assert!(AchievementDef::find("").is_none());
    }
}
