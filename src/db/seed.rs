use crate::config::AppConfig;
use crate::domain::models::UserRole;
use crate::services::password;
use anyhow::Result;
use serde_json::json;
use sqlx::PgPool;

struct SeedSkill<'a> {
    name: &'a str,
    category: &'a str,
    nsqf_level: i32,
    description: &'a str,
    industry_demand: f64,
}

struct SeedCourse<'a> {
    title: &'a str,
    description: &'a str,
    provider: &'a str,
    duration: &'a str,
    skill_level: &'a str,
    nsqf_level: i32,
    category: &'a str,
    is_certified: bool,
    thumbnail_url: &'a str,
    tags: &'a [&'a str],
}

struct SeedTrend<'a> {
    sector: &'a str,
    skill_name: &'a str,
    demand_growth: f64,
    salary_range: &'a str,
    job_count: i32,
    location: &'a str,
}

struct SeedProgram<'a> {
    title: &'a str,
    provider: &'a str,
    mode: &'a str,
    duration: &'a str,
    nsqf_level: i32,
    sector: &'a str,
    codes: &'a [&'a str],
    description: &'a str,
}

struct SeedJobRole<'a> {
    title: &'a str,
    sector: &'a str,
    nsqf_level: i32,
    codes: &'a [&'a str],
    description: &'a str,
    salary_range: &'a str,
    demand_level: &'a str,
}

/// Idempotent reference data; safe to run on every start.
pub async fn seed_all(pool: &PgPool, config: &AppConfig) -> Result<()> {
    seed_skills(pool).await?;
    seed_courses(pool).await?;
    seed_achievements(pool).await?;
    seed_trends(pool).await?;
    seed_qualifications(pool).await?;
    seed_training_programs(pool).await?;
    seed_job_roles(pool).await?;
    seed_admin(pool, config).await?;
    Ok(())
}

async fn seed_skills(pool: &PgPool) -> Result<()> {
    let skills = [
        SeedSkill {
            name: "Python Programming",
            category: "Programming",
            nsqf_level: 5,
            description: "Programming in Python language",
            industry_demand: 95.5,
        },
        SeedSkill {
            name: "Data Analysis",
            category: "Analytics",
            nsqf_level: 6,
            description: "Analyzing data using statistical methods",
            industry_demand: 92.3,
        },
        SeedSkill {
            name: "Machine Learning",
            category: "AI/ML",
            nsqf_level: 7,
            description: "Building and training ML models",
            industry_demand: 88.7,
        },
        SeedSkill {
            name: "SQL Database Management",
            category: "Database",
            nsqf_level: 5,
            description: "Managing relational databases",
            industry_demand: 89.2,
        },
        SeedSkill {
            name: "JavaScript Development",
            category: "Programming",
            nsqf_level: 5,
            description: "Frontend and backend JavaScript development",
            industry_demand: 91.8,
        },
    ];

    for skill in skills {
        sqlx::query(
            r#"
            INSERT INTO skills (name, category, nsqf_level, description, industry_demand)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(skill.name)
        .bind(skill.category)
        .bind(skill.nsqf_level)
        .bind(skill.description)
        .bind(skill.industry_demand)
        .execute(pool)
        .await?;
    }
    Ok(())
}

async fn seed_courses(pool: &PgPool) -> Result<()> {
    let courses = [
        SeedCourse {
            title: "Python for Data Analysis",
            description: "Comprehensive introduction to data analysis using Python and pandas. Learn to manipulate, analyze, and visualize data effectively.",
            provider: "DataCamp",
            duration: "8 weeks",
            skill_level: "beginner",
            nsqf_level: 4,
            category: "Data Analytics",
            is_certified: true,
            thumbnail_url: "https://images.unsplash.com/photo-1551288049-bebda4e38f71?auto=format&fit=crop&w=300&h=200",
            tags: &["python", "data analysis", "pandas", "visualization"],
        },
        SeedCourse {
            title: "Advanced Machine Learning",
            description: "Deep dive into ML algorithms, neural networks, and practical implementation using TensorFlow and PyTorch.",
            provider: "AI Academy",
            duration: "12 weeks",
            skill_level: "advanced",
            nsqf_level: 7,
            category: "AI & Machine Learning",
            is_certified: true,
            thumbnail_url: "https://images.unsplash.com/photo-1555949963-aa79dcee981c?auto=format&fit=crop&w=300&h=200",
            tags: &["machine learning", "tensorflow", "neural networks", "ai"],
        },
        SeedCourse {
            title: "Web Development Fundamentals",
            description: "Learn HTML, CSS, JavaScript, and modern web development practices including responsive design and frameworks.",
            provider: "CodeCraft",
            duration: "10 weeks",
            skill_level: "intermediate",
            nsqf_level: 5,
            category: "Software Development",
            is_certified: false,
            thumbnail_url: "https://images.unsplash.com/photo-1461749280684-dccba630e2f6?auto=format&fit=crop&w=300&h=200",
            tags: &["html", "css", "javascript", "responsive design"],
        },
        SeedCourse {
            title: "Digital Marketing Strategy",
            description: "Master digital marketing including SEO, social media marketing, content marketing, and analytics.",
            provider: "Marketing Pro",
            duration: "6 weeks",
            skill_level: "beginner",
            nsqf_level: 3,
            category: "Digital Marketing",
            is_certified: true,
            thumbnail_url: "https://images.unsplash.com/photo-1460925895917-afdab827c52f?auto=format&fit=crop&w=300&h=200",
            tags: &["seo", "social media", "content marketing", "analytics"],
        },
        SeedCourse {
            title: "Cybersecurity Fundamentals",
            description: "Introduction to cybersecurity principles, threat detection, and security best practices for organizations.",
            provider: "SecureLearn",
            duration: "8 weeks",
            skill_level: "intermediate",
            nsqf_level: 6,
            category: "Cybersecurity",
            is_certified: true,
            thumbnail_url: "https://images.unsplash.com/photo-1550751827-4bd374c3f58b?auto=format&fit=crop&w=300&h=200",
            tags: &["security", "threat detection", "network security", "compliance"],
        },
        SeedCourse {
            title: "Cloud Computing with AWS",
            description: "Learn Amazon Web Services including EC2, S3, Lambda, and cloud architecture best practices.",
            provider: "CloudTech",
            duration: "10 weeks",
            skill_level: "intermediate",
            nsqf_level: 6,
            category: "Cloud Computing",
            is_certified: true,
            thumbnail_url: "https://images.unsplash.com/photo-1451187580459-43490279c0fa?auto=format&fit=crop&w=300&h=200",
            tags: &["aws", "cloud computing", "ec2", "lambda"],
        },
    ];

    for course in courses {
        let tags: Vec<String> = course.tags.iter().map(|t| t.to_string()).collect();
        sqlx::query(
            r#"
            INSERT INTO courses
                (title, description, provider, duration, skill_level, nsqf_level, category,
                 is_certified, thumbnail_url, tags)
            VALUES ($1, $2, $3, $4, $5::proficiency_level, $6, $7, $8, $9, $10)
            ON CONFLICT (title) DO NOTHING
            "#,
        )
        .bind(course.title)
        .bind(course.description)
        .bind(course.provider)
        .bind(course.duration)
        .bind(course.skill_level)
        .bind(course.nsqf_level)
        .bind(course.category)
        .bind(course.is_certified)
        .bind(course.thumbnail_url)
        .bind(&tags)
        .execute(pool)
        .await?;
    }
    Ok(())
}

async fn seed_achievements(pool: &PgPool) -> Result<()> {
    let achievements = [
        ("First Steps", "Complete your first course", "footprints", "learning", 50, json!({"coursesCompleted": 1})),
        ("Skill Explorer", "Assess three skills", "compass", "skills", 75, json!({"skillsAssessed": 3})),
        ("Path Finder", "Create your first learning pathway", "map", "planning", 50, json!({"pathwaysCreated": 1})),
        ("Dedicated Learner", "Complete five courses", "award", "learning", 200, json!({"coursesCompleted": 5})),
    ];

    for (title, description, icon, category, points, requirements) in achievements {
        sqlx::query(
            r#"
            INSERT INTO achievements (title, description, icon, category, points, requirements)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (title) DO NOTHING
            "#,
        )
        .bind(title)
        .bind(description)
        .bind(icon)
        .bind(category)
        .bind(points)
        .bind(requirements)
        .execute(pool)
        .await?;
    }
    Ok(())
}

async fn seed_trends(pool: &PgPool) -> Result<()> {
    let trends = [
        SeedTrend {
            sector: "Information Technology",
            skill_name: "Python Programming",
            demand_growth: 24.5,
            salary_range: "6-15 LPA",
            job_count: 48200,
            location: "Bengaluru",
        },
        SeedTrend {
            sector: "Information Technology",
            skill_name: "Cloud Computing",
            demand_growth: 31.2,
            salary_range: "8-20 LPA",
            job_count: 35600,
            location: "Hyderabad",
        },
        SeedTrend {
            sector: "Analytics",
            skill_name: "Data Analysis",
            demand_growth: 27.8,
            salary_range: "5-12 LPA",
            job_count: 29400,
            location: "Pune",
        },
        SeedTrend {
            sector: "Electronics",
            skill_name: "Solar PV Installation",
            demand_growth: 18.4,
            salary_range: "2-4 LPA",
            job_count: 12800,
            location: "Jaipur",
        },
        SeedTrend {
            sector: "Digital Marketing",
            skill_name: "Search Engine Optimization",
            demand_growth: 15.1,
            salary_range: "3-8 LPA",
            job_count: 15300,
            location: "Mumbai",
        },
    ];

    for trend in trends {
        sqlx::query(
            r#"
            INSERT INTO industry_trends
                (sector, skill_name, demand_growth, salary_range, job_count, location)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (sector, skill_name, location) DO NOTHING
            "#,
        )
        .bind(trend.sector)
        .bind(trend.skill_name)
        .bind(trend.demand_growth)
        .bind(trend.salary_range)
        .bind(trend.job_count)
        .bind(trend.location)
        .execute(pool)
        .await?;
    }
    Ok(())
}

async fn seed_qualifications(pool: &PgPool) -> Result<()> {
    let qualifications = [
        ("ELE/Q3101", "Solar Panel Installation Technician", "Electronics", 4, "Installs and maintains rooftop and ground-mounted solar PV systems."),
        ("ELE/Q4601", "Field Technician - Computing and Peripherals", "Electronics", 4, "Installs and services desktops, laptops and peripherals at customer sites."),
        ("SSC/Q0501", "Software Developer", "IT-ITeS", 5, "Designs, codes and tests software modules to specification."),
        ("SSC/Q2101", "Junior Data Associate", "IT-ITeS", 5, "Cleans, analyses and reports on structured business data."),
        ("SSC/Q0901", "Security Analyst", "IT-ITeS", 6, "Monitors systems for threats and responds to security incidents."),
        ("MES/Q0702", "Social Media Executive", "Media and Entertainment", 4, "Plans and runs brand campaigns across social channels."),
    ];

    for (code, title, sector, level, description) in qualifications {
        sqlx::query(
            r#"
            INSERT INTO ncvet_qualifications (code, title, sector, nsqf_level, description)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (code) DO NOTHING
            "#,
        )
        .bind(code)
        .bind(title)
        .bind(sector)
        .bind(level)
        .bind(description)
        .execute(pool)
        .await?;
    }
    Ok(())
}

async fn seed_training_programs(pool: &PgPool) -> Result<()> {
    let programs = [
        SeedProgram {
            title: "PMKVY Solar Technician Programme",
            provider: "Skill India",
            mode: "offline",
            duration: "3 months",
            nsqf_level: 4,
            sector: "Electronics",
            codes: &["ELE/Q3101"],
            description: "Hands-on solar installation training with on-site practicals.",
        },
        SeedProgram {
            title: "Hardware and Networking Certificate",
            provider: "NIELIT",
            mode: "hybrid",
            duration: "4 months",
            nsqf_level: 4,
            sector: "Electronics",
            codes: &["ELE/Q4601"],
            description: "Computer hardware servicing and basic networking.",
        },
        SeedProgram {
            title: "FutureSkills Prime Full Stack Track",
            provider: "NASSCOM",
            mode: "online",
            duration: "6 months",
            nsqf_level: 5,
            sector: "IT-ITeS",
            codes: &["SSC/Q0501"],
            description: "Web application development from fundamentals to deployment.",
        },
        SeedProgram {
            title: "Data Analytics Bootcamp",
            provider: "NASSCOM",
            mode: "online",
            duration: "4 months",
            nsqf_level: 5,
            sector: "IT-ITeS",
            codes: &["SSC/Q2101"],
            description: "Spreadsheet, SQL and Python analytics with capstone projects.",
        },
        SeedProgram {
            title: "Cyber Security Essentials",
            provider: "CDAC",
            mode: "hybrid",
            duration: "5 months",
            nsqf_level: 6,
            sector: "IT-ITeS",
            codes: &["SSC/Q0901"],
            description: "Threat monitoring, incident response and compliance basics.",
        },
    ];

    for program in programs {
        let codes: Vec<String> = program.codes.iter().map(|c| c.to_string()).collect();
        sqlx::query(
            r#"
            INSERT INTO training_programs
                (title, provider, mode, duration, nsqf_level, sector, qualification_codes,
                 is_certified, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE, $8)
            ON CONFLICT (title) DO NOTHING
            "#,
        )
        .bind(program.title)
        .bind(program.provider)
        .bind(program.mode)
        .bind(program.duration)
        .bind(program.nsqf_level)
        .bind(program.sector)
        .bind(&codes)
        .bind(program.description)
        .execute(pool)
        .await?;
    }
    Ok(())
}

async fn seed_job_roles(pool: &PgPool) -> Result<()> {
    let roles = [
        SeedJobRole {
            title: "Solar PV Installer",
            sector: "Electronics",
            nsqf_level: 4,
            codes: &["ELE/Q3101"],
            description: "Installs and commissions solar power systems.",
            salary_range: "2-4 LPA",
            demand_level: "high",
        },
        SeedJobRole {
            title: "Field Service Engineer",
            sector: "Electronics",
            nsqf_level: 4,
            codes: &["ELE/Q4601"],
            description: "Diagnoses and repairs computing equipment on site.",
            salary_range: "2.5-5 LPA",
            demand_level: "medium",
        },
        SeedJobRole {
            title: "Junior Software Developer",
            sector: "IT-ITeS",
            nsqf_level: 5,
            codes: &["SSC/Q0501"],
            description: "Builds and maintains application features.",
            salary_range: "4-8 LPA",
            demand_level: "high",
        },
        SeedJobRole {
            title: "Data Analyst",
            sector: "IT-ITeS",
            nsqf_level: 5,
            codes: &["SSC/Q2101"],
            description: "Turns operational data into reports and insights.",
            salary_range: "4-9 LPA",
            demand_level: "high",
        },
        SeedJobRole {
            title: "SOC Analyst",
            sector: "IT-ITeS",
            nsqf_level: 6,
            codes: &["SSC/Q0901"],
            description: "Watches security alerts and escalates incidents.",
            salary_range: "5-10 LPA",
            demand_level: "high",
        },
    ];

    for role in roles {
        let codes: Vec<String> = role.codes.iter().map(|c| c.to_string()).collect();
        sqlx::query(
            r#"
            INSERT INTO job_roles
                (title, sector, nsqf_level, qualification_codes, description, salary_range,
                 demand_level)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (title) DO NOTHING
            "#,
        )
        .bind(role.title)
        .bind(role.sector)
        .bind(role.nsqf_level)
        .bind(&codes)
        .bind(role.description)
        .bind(role.salary_range)
        .bind(role.demand_level)
        .execute(pool)
        .await?;
    }
    Ok(())
}

async fn seed_admin(pool: &PgPool, config: &AppConfig) -> Result<()> {
    let Some(admin) = &config.admin else {
        return Ok(());
    };

    let email = admin.email.trim().to_lowercase();
    let hash = password::hash_password(&admin.password)?;
    let inserted = sqlx::query(
        r#"
        INSERT INTO users (email, password_hash, role, first_name, last_name, survey_completed)
        VALUES ($1, $2, $3, 'Platform', 'Admin', TRUE)
        ON CONFLICT (email) DO NOTHING
        "#,
    )
    .bind(&email)
    .bind(hash)
    .bind(UserRole::Policymaker)
    .execute(pool)
    .await?;

    if inserted.rows_affected() > 0 {
        tracing::info!(%email, "bootstrap administrator created");
    }
    Ok(())
}
