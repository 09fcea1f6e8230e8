use super::*;
use reflex_types::execution::LegacySource;

impl<'a, S: State> Layer<'a, S> {
    pub(in crate::layer) async fn handle_set_verification(
        &mut self,
        public: &PublicKey,
        target: &PublicKey,
        level: VerificationLevel,
        verified: bool,
    ) -> anyhow::Result<Vec<Event>> {
        // The verification service runs as an authorized submitter; the owner
        // may also assert tiers directly.
        let economy = self.get_or_init_economy().await?;
        if !economy.is_authorized_submitter(public) && !is_owner_public_key(public) {
            return Ok(economy_error_vec(
                public,
                ERROR_UNAUTHORIZED,
                "Not authorized to set verification",
            ));
        }

        let mut player = self.get_or_init_player(target).await?;
        player.verification.level = level;
        player.verification.is_verified = verified;
        self.insert(Key::Player(target.clone()), Value::Player(player));

        Ok(vec![Event::VerificationUpdated {
            player: target.clone(),
            level,
            verified,
        }])
    }

    pub(in crate::layer) async fn handle_set_authorized_submitter(
        &mut self,
        public: &PublicKey,
        submitter: &PublicKey,
        authorized: bool,
    ) -> anyhow::Result<Vec<Event>> {
        if !is_owner_public_key(public) {
            return Ok(economy_error_vec(
                public,
                ERROR_UNAUTHORIZED,
                "Owner only",
            ));
        }

        let mut economy = self.get_or_init_economy().await?;
        economy.set_authorized_submitter(submitter, authorized);
        self.insert(Key::Economy, Value::Economy(economy));

        Ok(vec![Event::SubmitterAuthorized {
            submitter: submitter.clone(),
            authorized,
        }])
    }

    pub(in crate::layer) async fn handle_update_pricing(
        &mut self,
        public: &PublicKey,
        tokens_per_point: u128,
        turn_cost: u128,
        weekly_pass_cost: u128,
    ) -> anyhow::Result<Vec<Event>> {
        if !is_owner_public_key(public) {
            return Ok(economy_error_vec(
                public,
                ERROR_UNAUTHORIZED,
                "Owner only",
            ));
        }
        if !PricingConfig::in_bounds(tokens_per_point, turn_cost, weekly_pass_cost) {
            return Ok(economy_error_vec(
                public,
                ERROR_PRICING_OUT_OF_BOUNDS,
                "Pricing outside allowed bounds",
            ));
        }

        let mut economy = self.get_or_init_economy().await?;
        economy.pricing.tokens_per_point = tokens_per_point;
        economy.pricing.turn_cost = turn_cost;
        economy.pricing.weekly_pass_cost = weekly_pass_cost;
        self.insert(Key::Economy, Value::Economy(economy));

        Ok(vec![Event::PricingUpdated {
            tokens_per_point,
            turn_cost,
            weekly_pass_cost,
        }])
    }

    pub(in crate::layer) async fn handle_update_multipliers(
        &mut self,
        public: &PublicKey,
        orb_plus: u16,
        orb: u16,
        secure_document: u16,
        document: u16,
    ) -> anyhow::Result<Vec<Event>> {
        if !is_owner_public_key(public) {
            return Ok(economy_error_vec(
                public,
                ERROR_UNAUTHORIZED,
                "Owner only",
            ));
        }
        let table = MultiplierTable {
            orb_plus,
            orb,
            secure_document,
            document,
        };
        if table.validate().is_err() {
            return Ok(economy_error_vec(
                public,
                ERROR_HIERARCHY_VIOLATION,
                "Multiplier hierarchy violated",
            ));
        }

        let mut economy = self.get_or_init_economy().await?;
        economy.multipliers = table;
        self.insert(Key::Economy, Value::Economy(economy));

        Ok(vec![Event::MultipliersUpdated {
            orb_plus,
            orb,
            secure_document,
            document,
        }])
    }

    pub(in crate::layer) async fn handle_set_paused(
        &mut self,
        public: &PublicKey,
        paused: bool,
    ) -> anyhow::Result<Vec<Event>> {
        if !is_owner_public_key(public) {
            return Ok(economy_error_vec(
                public,
                ERROR_UNAUTHORIZED,
                "Owner only",
            ));
        }

        let mut economy = self.get_or_init_economy().await?;
        economy.paused = paused;
        self.insert(Key::Economy, Value::Economy(economy));

        Ok(vec![Event::PausedSet { paused }])
    }

    pub(in crate::layer) async fn handle_seed_leaderboard(
        &mut self,
        public: &PublicKey,
        mode: GameMode,
        entries: &[LeaderboardEntry],
    ) -> anyhow::Result<Vec<Event>> {
        if !is_owner_public_key(public) {
            return Ok(economy_error_vec(
                public,
                ERROR_UNAUTHORIZED,
                "Owner only",
            ));
        }

        let mut board = self.get_or_init_leaderboard(mode).await?;
        board.seed(entries.to_vec());
        let count = board.len() as u32;
        self.insert(Key::Leaderboard(mode), Value::Leaderboard(board));

        Ok(vec![Event::LeaderboardSeeded { mode, count }])
    }

    pub(in crate::layer) async fn handle_withdraw_fees(
        &mut self,
        public: &PublicKey,
    ) -> anyhow::Result<Vec<Event>> {
        if !is_owner_public_key(public) {
            return Ok(economy_error_vec(
                public,
                ERROR_UNAUTHORIZED,
                "Owner only",
            ));
        }

        let mut owner = self.get_or_init_player(public).await?;
        let mut ledger = self.get_or_init_ledger().await?;
        let amount = ledger.withdraw_fees(&mut owner.balance);
        self.insert(Key::Player(public.clone()), Value::Player(owner));
        self.insert(Key::Ledger, Value::Ledger(ledger));

        Ok(vec![Event::FeesWithdrawn {
            to: public.clone(),
            amount,
        }])
    }

    pub(in crate::layer) async fn handle_seed_legacy_balance(
        &mut self,
        public: &PublicKey,
        source: LegacySource,
        target: &PublicKey,
        amount: u128,
    ) -> anyhow::Result<Vec<Event>> {
        if !is_owner_public_key(public) {
            return Ok(economy_error_vec(
                public,
                ERROR_UNAUTHORIZED,
                "Owner only",
            ));
        }
        if amount == 0 {
            return Ok(economy_error_vec(
                public,
                ERROR_INVALID_AMOUNT,
                "Amount must be positive",
            ));
        }

        self.insert(
            Key::LegacyBalance(source, target.clone()),
            Value::LegacyBalance(amount),
        );

        Ok(vec![Event::LegacyBalanceSeeded {
            source,
            player: target.clone(),
            amount,
        }])
    }
}
