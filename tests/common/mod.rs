//! In-memory stand-ins for the Postgres-backed Unit of Work and the mailer.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use green_campus::domain::{
    ActivityLog, ActivityType, Building, Category, EnergyCategory, EnergyReading, Ledger, Product,
    Redemption, User,
};
use green_campus::errors::{AppError, AppResult};
use green_campus::infra::{
    ActivityRepository, DayAverage, EmailMessage, EnergyRepository, Mailer, ProductRepository,
    RedemptionPlan, Repricer, RewardRepository, UnitOfWork, UserRepository,
};

#[derive(Default)]
pub struct MemoryUsers(Mutex<Vec<User>>);

#[async_trait]
impl UserRepository for MemoryUsers {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.0.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .0
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn create(&self, user: User) -> AppResult<User> {
        let mut users = self.0.lock().unwrap();
        if users.iter().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(AppError::conflict("Email already registered"));
        }
        users.push(user.clone());
        Ok(user)
    }

    async fn save(&self, user: &User) -> AppResult<User> {
        let mut users = self.0.lock().unwrap();
        let slot = users.iter_mut().find(|u| u.id == user.id).ok_or(AppError::NotFound)?;
        *slot = user.clone();
        Ok(user.clone())
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        Ok(self.0.lock().unwrap().clone())
    }

    async fn emails(&self) -> AppResult<Vec<String>> {
        Ok(self.0.lock().unwrap().iter().map(|u| u.email.clone()).collect())
    }
}

#[derive(Default)]
pub struct MemoryProducts(Mutex<Vec<Product>>);

#[async_trait]
impl ProductRepository for MemoryProducts {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Product>> {
        Ok(self.0.lock().unwrap().iter().find(|p| p.id == id).cloned())
    }

    async fn find_by_vendor_and_name(&self, vendor_id: Uuid, name: &str) -> AppResult<Option<Product>> {
        Ok(self
            .0
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.vendor_id == vendor_id && p.name == name)
            .cloned())
    }

    async fn insert(&self, product: Product) -> AppResult<Product> {
        self.0.lock().unwrap().push(product.clone());
        Ok(product)
    }

    async fn update(&self, product: Product) -> AppResult<Product> {
        let mut products = self.0.lock().unwrap();
        let slot = products.iter_mut().find(|p| p.id == product.id).ok_or(AppError::NotFound)?;
        *slot = product.clone();
        Ok(product)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut products = self.0.lock().unwrap();
        let before = products.len();
        products.retain(|p| p.id != id);
        if products.len() == before {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn list_by_vendor(&self, vendor_id: Uuid) -> AppResult<Vec<Product>> {
        let mut found: Vec<Product> = self
            .0
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.vendor_id == vendor_id)
            .cloned()
            .collect();
        found.sort_by_key(|p| p.expiry_date);
        Ok(found)
    }

    async fn list_available(&self, category: Category, from: NaiveDate) -> AppResult<Vec<Product>> {
        let mut found: Vec<Product> = self
            .0
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.category == category && p.units > 0 && p.expiry_date >= from)
            .cloned()
            .collect();
        found.sort_by_key(|p| p.expiry_date);
        Ok(found)
    }

    async fn list_expiring(&self, from: NaiveDate, to: NaiveDate) -> AppResult<Vec<Product>> {
        let mut found: Vec<Product> = self
            .0
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.expiry_date >= from && p.expiry_date <= to)
            .cloned()
            .collect();
        found.sort_by_key(|p| p.expiry_date);
        Ok(found)
    }
}

#[derive(Default)]
pub struct MemoryActivities(Mutex<Vec<ActivityLog>>);

#[async_trait]
impl ActivityRepository for MemoryActivities {
    async fn insert(&self, log: ActivityLog) -> AppResult<ActivityLog> {
        let mut logs = self.0.lock().unwrap();
        if logs.iter().any(|l| {
            l.user_id == log.user_id
                && l.activity_date == log.activity_date
                && l.activity_type == log.activity_type
        }) {
            return Err(AppError::conflict("Activity already logged for that day"));
        }
        logs.push(log.clone());
        Ok(log)
    }

    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<ActivityLog>> {
        let mut found: Vec<ActivityLog> = self
            .0
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by_key(|l| l.activity_date);
        Ok(found)
    }

    async fn last_logged_date(&self, user_id: Uuid) -> AppResult<Option<NaiveDate>> {
        Ok(self
            .0
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.user_id == user_id)
            .map(|l| l.activity_date)
            .max())
    }

    async fn daily_averages(&self, _activity_type: ActivityType) -> AppResult<Vec<DayAverage>> {
        Ok(Vec::new())
    }
}

#[derive(Default)]
pub struct MemoryRewards(Mutex<Vec<Redemption>>);

#[async_trait]
impl RewardRepository for MemoryRewards {
    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Redemption>> {
        Ok(self
            .0
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_by_code(&self, code: &str) -> AppResult<Option<Redemption>> {
        Ok(self.0.lock().unwrap().iter().find(|r| r.voucher_code == code).cloned())
    }

    async fn mark_claimed(&self, redemption: &Redemption) -> AppResult<()> {
        let mut all = self.0.lock().unwrap();
        let slot = all.iter_mut().find(|r| r.id == redemption.id).ok_or(AppError::NotFound)?;
        if slot.claimed_at.is_some() {
            return Err(AppError::conflict("Voucher already claimed"));
        }
        *slot = redemption.clone();
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryEnergy {
    buildings: Mutex<Vec<Building>>,
    readings: Mutex<Vec<EnergyReading>>,
}

#[async_trait]
impl EnergyRepository for MemoryEnergy {
    async fn find_building(&self, name: &str) -> AppResult<Option<Building>> {
        Ok(self.buildings.lock().unwrap().iter().find(|b| b.name == name).cloned())
    }

    async fn ensure_building(&self, name: &str, code: &str, zone: &str) -> AppResult<Building> {
        let mut buildings = self.buildings.lock().unwrap();
        if let Some(found) = buildings.iter().find(|b| b.name == name) {
            return Ok(found.clone());
        }
        let building = Building {
            id: Uuid::new_v4(),
            name: name.to_string(),
            code: code.to_string(),
            zone: zone.to_string(),
        };
        buildings.push(building.clone());
        Ok(building)
    }

    async fn insert_readings(&self, readings: Vec<EnergyReading>) -> AppResult<u64> {
        let count = readings.len() as u64;
        self.readings.lock().unwrap().extend(readings);
        Ok(count)
    }

    async fn readings(
        &self,
        building_id: Uuid,
        category: EnergyCategory,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<EnergyReading>> {
        let mut found: Vec<EnergyReading> = self
            .readings
            .lock()
            .unwrap()
            .iter()
            .filter(|r| {
                r.building_id == building_id
                    && r.category == category
                    && r.timestamp >= from
                    && r.timestamp <= to
            })
            .cloned()
            .collect();
        found.sort_by_key(|r| r.timestamp);
        Ok(found)
    }

    async fn building_names(&self) -> AppResult<Vec<String>> {
        Ok(self
            .buildings
            .lock()
            .unwrap()
            .iter()
            .filter(|b| !b.code.is_empty())
            .map(|b| b.name.clone())
            .collect())
    }

    async fn usage_by_zone(&self, category: EnergyCategory) -> AppResult<Vec<(String, f64)>> {
        let buildings = self.buildings.lock().unwrap().clone();
        let readings = self.readings.lock().unwrap();
        Ok(buildings
            .iter()
            .filter(|b| !b.code.is_empty())
            .map(|b| {
                let total = readings
                    .iter()
                    .filter(|r| r.building_id == b.id && r.category == category)
                    .map(|r| r.value)
                    .sum();
                (b.zone.clone(), total)
            })
            .collect())
    }
}

/// Unit of Work over the in-memory stores. Transactions are a lock-free
/// read, plan and write, which is enough for single-threaded tests.
#[derive(Default)]
pub struct MemoryUnitOfWork {
    pub users: Arc<MemoryUsers>,
    pub products: Arc<MemoryProducts>,
    pub activities: Arc<MemoryActivities>,
    pub rewards: Arc<MemoryRewards>,
    pub energy: Arc<MemoryEnergy>,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.users.clone()
    }

    fn products(&self) -> Arc<dyn ProductRepository> {
        self.products.clone()
    }

    fn activities(&self) -> Arc<dyn ActivityRepository> {
        self.activities.clone()
    }

    fn rewards(&self) -> Arc<dyn RewardRepository> {
        self.rewards.clone()
    }

    fn energy(&self) -> Arc<dyn EnergyRepository> {
        self.energy.clone()
    }

    async fn redeem(&self, user_id: Uuid, plan: RedemptionPlan) -> AppResult<Redemption> {
        let logs = self.activities.list_for_user(user_id).await?;
        let prior = self.rewards.list_for_user(user_id).await?;
        let ledger = Ledger::new(&logs, prior.iter().flat_map(|r| r.debits.iter()));

        let issued = plan(&ledger)?;
        self.rewards.0.lock().unwrap().push(issued.clone());
        Ok(issued)
    }

    async fn reprice_window(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        reprice: Repricer,
    ) -> AppResult<Vec<Product>> {
        let mut repriced = Vec::new();
        for mut item in self.products.list_expiring(from, to).await? {
            reprice(&mut item)?;
            repriced.push(self.products.update(item).await?);
        }
        Ok(repriced)
    }
}

/// Records every message instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<EmailMessage>>,
}

impl RecordingMailer {
    pub fn sent_to(&self, to: &str) -> Vec<EmailMessage> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.to == to)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: EmailMessage) -> AppResult<()> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}
